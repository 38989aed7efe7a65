//! Variable declarations.
//!
//! A `VariableSpec` describes one computable quantity: its value type,
//! default, the period granularity it is defined for, the entity whose
//! population it belongs to and, optionally, the formula that computes it.
//! Variables without a formula are inputs. Enum variables also carry the
//! `Enumeration` their arrays index into.

use std::fmt;
use std::sync::Arc;

use crate::entity::Population;
use crate::enumeration::Enumeration;
use crate::error::{CalcResult, ValidationError};
use crate::period::{DateUnit, Period};
use crate::value::{Array, FormulaOutput, Value, ValueType};

/// A formula: computes a variable for one period over a whole population.
///
/// The `Population` argument is the accessor for every other variable; reading
/// through it re-enters the evaluator.
pub type Formula =
    Arc<dyn Fn(&mut Population<'_>, &Period) -> CalcResult<FormulaOutput> + Send + Sync>;

/// Immutable declaration of a variable.
#[derive(Clone)]
pub struct VariableSpec {
    /// Unique name in the registry.
    pub name: String,
    /// Element type of computed arrays.
    pub value_type: ValueType,
    /// Fill value for inputs without data and for spiral short-circuits.
    pub default_value: Value,
    /// Granularity the variable is computed at.
    pub definition_period: DateUnit,
    /// Key of the entity whose population the variable belongs to.
    pub entity: String,
    /// Optional human-readable description.
    pub label: Option<String>,
    /// Possible values of an enum variable.
    pub possible_values: Option<Arc<Enumeration>>,
    formula: Option<Formula>,
}

impl fmt::Debug for VariableSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VariableSpec")
            .field("name", &self.name)
            .field("value_type", &self.value_type)
            .field("default_value", &self.default_value)
            .field("definition_period", &self.definition_period)
            .field("entity", &self.entity)
            .field("label", &self.label)
            .field("possible_values", &self.possible_values.as_ref().map(|e| e.name()))
            .field("has_formula", &self.formula.is_some())
            .finish()
    }
}

impl VariableSpec {
    /// Creates a builder for a variable named `name`.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> VariableBuilder {
        VariableBuilder::new(name)
    }

    /// The formula, absent for inputs.
    #[must_use]
    pub fn formula(&self) -> Option<&Formula> {
        self.formula.as_ref()
    }

    /// Returns true if the variable has no formula and is set from inputs.
    #[must_use]
    pub fn is_input(&self) -> bool {
        self.formula.is_none()
    }

    /// Checks that an array already cast to the value type fits the variable.
    pub(crate) fn check(&self, array: &Array) -> Result<(), ValidationError> {
        match &self.possible_values {
            Some(enumeration) => enumeration.check(&self.name, array),
            None => Ok(()),
        }
    }
}

/// Builder for `VariableSpec`.
///
/// `value_type`, `entity` and `definition_period` are required; the default
/// value falls back to the zero of the value type.
#[derive(Default)]
pub struct VariableBuilder {
    name: String,
    value_type: Option<ValueType>,
    default_value: Option<Value>,
    definition_period: Option<DateUnit>,
    entity: Option<String>,
    label: Option<String>,
    possible_values: Option<Enumeration>,
    formula: Option<Formula>,
}

impl VariableBuilder {
    /// Creates an empty builder for `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sets the element type.
    #[must_use]
    pub fn value_type(mut self, value_type: ValueType) -> Self {
        self.value_type = Some(value_type);
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Sets the unit the variable is computed at.
    #[must_use]
    pub fn definition_period(mut self, unit: DateUnit) -> Self {
        self.definition_period = Some(unit);
        self
    }

    /// Sets the owning entity.
    #[must_use]
    pub fn entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Makes this an enum variable over `enumeration`. The value type becomes
    /// `ValueType::Enum` and the default is the enumeration's default member
    /// unless one is set explicitly.
    #[must_use]
    pub fn possible_values(mut self, enumeration: Enumeration) -> Self {
        self.value_type = Some(ValueType::Enum);
        self.possible_values = Some(enumeration);
        self
    }

    /// Sets the formula. Its output may be an `Array` or any scalar
    /// convertible to `FormulaOutput`.
    #[must_use]
    pub fn formula<F, O>(mut self, formula: F) -> Self
    where
        F: Fn(&mut Population<'_>, &Period) -> CalcResult<O> + Send + Sync + 'static,
        O: Into<FormulaOutput>,
    {
        self.formula = Some(Arc::new(move |population: &mut Population<'_>, period: &Period| {
            formula(population, period).map(Into::into)
        }));
        self
    }

    /// Builds the spec.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if the name is blank, a required field is
    /// missing, the default value does not match the value type, or the
    /// possible values do not agree with the value type.
    pub fn build(self) -> Result<VariableSpec, ValidationError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(ValidationError::EmptyVariableName);
        }
        let value_type = self.value_type.ok_or(ValidationError::MissingField {
            field: "value_type".to_string(),
        })?;
        let definition_period = self.definition_period.ok_or(ValidationError::MissingField {
            field: "definition_period".to_string(),
        })?;
        let entity = self.entity.ok_or(ValidationError::MissingField {
            field: "entity".to_string(),
        })?;

        let possible_values = match (value_type, self.possible_values) {
            (ValueType::Enum, Some(enumeration)) => Some(Arc::new(enumeration)),
            (ValueType::Enum, None) => {
                return Err(ValidationError::MissingField {
                    field: "possible_values".to_string(),
                })
            }
            (_, Some(_)) => {
                return Err(ValidationError::InvalidEnum {
                    name,
                    reason: format!("possible values on a {value_type} variable"),
                })
            }
            (_, None) => None,
        };

        let default_value = match self.default_value {
            None => possible_values
                .as_ref()
                .map_or_else(|| value_type.zero(), |e| e.default_value()),
            // Integer literals are fine for float variables.
            Some(Value::Int(v)) if value_type == ValueType::Float => Value::Int(v).cast(value_type),
            Some(v) if v.value_type() == value_type => v,
            Some(v) => {
                return Err(ValidationError::DefaultTypeMismatch {
                    variable: name,
                    expected: value_type,
                    actual: v.value_type(),
                })
            }
        };

        if let (Some(enumeration), Value::Enum(idx)) = (&possible_values, default_value) {
            if enumeration.member(idx).is_none() {
                return Err(ValidationError::InvalidEnum {
                    name,
                    reason: format!("default index {idx} is not a member of '{}'", enumeration.name()),
                });
            }
        }

        Ok(VariableSpec {
            name,
            value_type,
            default_value,
            definition_period,
            entity,
            label: self.label,
            possible_values,
            formula: self.formula,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base(name: &str) -> VariableBuilder {
        VariableSpec::builder(name)
            .value_type(ValueType::Int)
            .entity("person")
            .definition_period(DateUnit::Month)
    }

    #[test]
    fn test_build_input_variable() {
        let spec = base("salary").label("Monthly salary").build().unwrap();
        assert_eq!(spec.name, "salary");
        assert_eq!(spec.default_value, Value::Int(0));
        assert!(spec.is_input());
        assert!(spec.formula().is_none());
    }

    #[test]
    fn test_build_with_formula() {
        let spec = base("bonus").formula(|_, _| Ok(5_i64)).build().unwrap();
        assert!(!spec.is_input());
        assert!(format!("{spec:?}").contains("has_formula: true"));
    }

    #[test]
    fn test_build_requires_fields() {
        assert_eq!(
            VariableSpec::builder("  ").build().unwrap_err(),
            ValidationError::EmptyVariableName
        );
        let err = VariableSpec::builder("x")
            .value_type(ValueType::Int)
            .definition_period(DateUnit::Month)
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingField {
                field: "entity".to_string()
            }
        );
    }

    #[test]
    fn test_default_value_type_is_checked() {
        let err = base("x").default_value(true).build().unwrap_err();
        assert!(matches!(err, ValidationError::DefaultTypeMismatch { .. }));

        let float = VariableSpec::builder("y")
            .value_type(ValueType::Float)
            .entity("person")
            .definition_period(DateUnit::Year)
            .default_value(3)
            .build()
            .unwrap();
        assert_eq!(float.default_value, Value::Float(3.0));
    }

    fn housing() -> Enumeration {
        Enumeration::new("housing", ["tenant", "owner", "free_lodger"])
            .unwrap()
            .with_default("owner")
            .unwrap()
    }

    #[test]
    fn test_enum_variable_defaults_to_default_member() {
        let spec = VariableSpec::builder("housing_occupancy_status")
            .possible_values(housing())
            .entity("household")
            .definition_period(DateUnit::Month)
            .build()
            .unwrap();
        assert_eq!(spec.value_type, ValueType::Enum);
        assert_eq!(spec.default_value, Value::Enum(1));
        assert!(spec.check(&Array::Enum(vec![0, 2])).is_ok());
        assert!(spec.check(&Array::Enum(vec![3])).is_err());
    }

    #[test]
    fn test_enum_variable_validation() {
        let missing = VariableSpec::builder("status")
            .value_type(ValueType::Enum)
            .entity("household")
            .definition_period(DateUnit::Month)
            .build()
            .unwrap_err();
        assert_eq!(
            missing,
            ValidationError::MissingField {
                field: "possible_values".to_string()
            }
        );

        let out_of_range = VariableSpec::builder("status")
            .possible_values(housing())
            .default_value(Value::Enum(7))
            .entity("household")
            .definition_period(DateUnit::Month)
            .build()
            .unwrap_err();
        assert!(matches!(out_of_range, ValidationError::InvalidEnum { .. }));

        let not_enum = base("status")
            .possible_values(housing())
            .value_type(ValueType::Int)
            .build()
            .unwrap_err();
        assert!(matches!(not_enum, ValidationError::InvalidEnum { .. }));
    }
}
