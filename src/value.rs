//! Values and arrays produced by formulas.
//!
//! Every variable has a `ValueType`. A computed result is an `Array` holding
//! one value per member of the variable's population. Formulas may also return
//! a single scalar, which the evaluator broadcasts to the population size.
//!
//! Enum arrays hold member indices of an `Enumeration`. They support equality
//! tests only; arithmetic on them is a `ValidationError::ForbiddenOperation`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Element type of a variable's arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    /// Booleans.
    Bool,
    /// 64-bit integers.
    Int,
    /// 64-bit floats.
    Float,
    /// Member indices of an `Enumeration`.
    Enum,
}

impl ValueType {
    /// The zero value of this type, used when a variable declares no default.
    #[must_use]
    pub const fn zero(self) -> Value {
        match self {
            Self::Bool => Value::Bool(false),
            Self::Int => Value::Int(0),
            Self::Float => Value::Float(0.0),
            Self::Enum => Value::Enum(0),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => write!(f, "bool"),
            Self::Int => write!(f, "int"),
            Self::Float => write!(f, "float"),
            Self::Enum => write!(f, "enum"),
        }
    }
}

/// A single scalar value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    /// A boolean.
    Bool(bool),
    /// An integer.
    Int(i64),
    /// A float.
    Float(f64),
    /// A member index of an `Enumeration`.
    Enum(u16),
}

impl Value {
    /// Type of the value.
    #[must_use]
    pub const fn value_type(&self) -> ValueType {
        match self {
            Self::Bool(_) => ValueType::Bool,
            Self::Int(_) => ValueType::Int,
            Self::Float(_) => ValueType::Float,
            Self::Enum(_) => ValueType::Enum,
        }
    }

    /// The value as a float; enum members give their index.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn as_f64(&self) -> f64 {
        match self {
            Self::Bool(v) => f64::from(u8::from(*v)),
            Self::Int(v) => *v as f64,
            Self::Float(v) => *v,
            Self::Enum(v) => f64::from(*v),
        }
    }

    /// Converts the value to `value_type`. Floats truncate towards zero when
    /// cast to integers; any non-zero number is `true`. Numbers that are not
    /// a valid index become `u16::MAX` when cast to an enum, which no
    /// enumeration accepts.
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    #[must_use]
    pub fn cast(self, value_type: ValueType) -> Self {
        match (self, value_type) {
            (Self::Bool(v), ValueType::Bool) => Self::Bool(v),
            (Self::Bool(v), ValueType::Int) => Self::Int(i64::from(v)),
            (Self::Bool(v), ValueType::Float) => Self::Float(f64::from(u8::from(v))),
            (Self::Bool(v), ValueType::Enum) => Self::Enum(u16::from(v)),
            (Self::Int(v), ValueType::Bool) => Self::Bool(v != 0),
            (Self::Int(v), ValueType::Int) => Self::Int(v),
            (Self::Int(v), ValueType::Float) => Self::Float(v as f64),
            (Self::Int(v), ValueType::Enum) => Self::Enum(u16::try_from(v).unwrap_or(u16::MAX)),
            (Self::Float(v), ValueType::Bool) => Self::Bool(v != 0.0),
            (Self::Float(v), ValueType::Int) => Self::Int(v as i64),
            (Self::Float(v), ValueType::Float) => Self::Float(v),
            (Self::Float(v), ValueType::Enum) => Self::Int(v as i64).cast(ValueType::Enum),
            (Self::Enum(v), ValueType::Bool) => Self::Bool(v != 0),
            (Self::Enum(v), ValueType::Int) => Self::Int(i64::from(v)),
            (Self::Enum(v), ValueType::Float) => Self::Float(f64::from(v)),
            (Self::Enum(v), ValueType::Enum) => Self::Enum(v),
        }
    }

    /// Equality across types. Enum members only equal enum members; numbers
    /// and booleans compare by value.
    #[allow(clippy::float_cmp)]
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Enum(a), Self::Enum(b)) => a == b,
            (Self::Enum(_), _) | (_, Self::Enum(_)) => false,
            (a, b) => a.as_f64() == b.as_f64(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Enum(v) => write!(f, "#{v}"),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

/// A typed column of values, one per population member.
///
/// # Examples
///
/// ```
/// use lazycalc::{Array, Value};
///
/// let base = Array::filled(Value::Int(6), 2);
/// assert_eq!(base.add_scalar(Value::Int(5)).unwrap(), Array::from(vec![11_i64, 11]));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "values", rename_all = "snake_case")]
pub enum Array {
    /// Booleans.
    Bool(Vec<bool>),
    /// Integers.
    Int(Vec<i64>),
    /// Floats.
    Float(Vec<f64>),
    /// Enumeration member indices.
    Enum(Vec<u16>),
}

impl Array {
    /// An array of `len` copies of `value`.
    #[must_use]
    pub fn filled(value: Value, len: usize) -> Self {
        match value {
            Value::Bool(v) => Self::Bool(vec![v; len]),
            Value::Int(v) => Self::Int(vec![v; len]),
            Value::Float(v) => Self::Float(vec![v; len]),
            Value::Enum(v) => Self::Enum(vec![v; len]),
        }
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Bool(v) => v.len(),
            Self::Int(v) => v.len(),
            Self::Float(v) => v.len(),
            Self::Enum(v) => v.len(),
        }
    }

    /// Returns true if the array has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element type.
    #[must_use]
    pub const fn value_type(&self) -> ValueType {
        match self {
            Self::Bool(_) => ValueType::Bool,
            Self::Int(_) => ValueType::Int,
            Self::Float(_) => ValueType::Float,
            Self::Enum(_) => ValueType::Enum,
        }
    }

    /// Element at `index`, if in bounds.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<Value> {
        match self {
            Self::Bool(v) => v.get(index).copied().map(Value::Bool),
            Self::Int(v) => v.get(index).copied().map(Value::Int),
            Self::Float(v) => v.get(index).copied().map(Value::Float),
            Self::Enum(v) => v.get(index).copied().map(Value::Enum),
        }
    }

    /// Iterates over the elements as scalars.
    pub fn iter(&self) -> impl Iterator<Item = Value> + '_ {
        (0..self.len()).filter_map(move |i| self.get(i))
    }

    /// Converts every element to `value_type`.
    #[must_use]
    pub fn cast(&self, value_type: ValueType) -> Self {
        if self.value_type() == value_type {
            return self.clone();
        }
        let values = self.iter().map(|v| v.cast(value_type));
        match value_type {
            ValueType::Bool => Self::Bool(values.map(|v| matches!(v, Value::Bool(true))).collect()),
            ValueType::Int => Self::Int(
                values
                    .map(|v| match v {
                        Value::Int(i) => i,
                        _ => 0,
                    })
                    .collect(),
            ),
            ValueType::Float => Self::Float(values.map(|v| v.as_f64()).collect()),
            ValueType::Enum => Self::Enum(
                values
                    .map(|v| match v {
                        Value::Enum(i) => i,
                        _ => u16::MAX,
                    })
                    .collect(),
            ),
        }
    }

    /// The elements as floats.
    #[must_use]
    pub fn to_f64(&self) -> Vec<f64> {
        self.iter().map(|v| v.as_f64()).collect()
    }

    /// Adds a scalar to every element. Integer stays integer only when both
    /// sides are integral (booleans count as integers).
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::ForbiddenOperation` if either side is an enum.
    pub fn add_scalar(&self, rhs: Value) -> Result<Self, ValidationError> {
        self.combine_scalar("add", rhs, i64::saturating_add, |a, b| a + b)
    }

    /// Multiplies every element by a scalar.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::ForbiddenOperation` if either side is an enum.
    pub fn mul_scalar(&self, rhs: Value) -> Result<Self, ValidationError> {
        self.combine_scalar("mul", rhs, i64::saturating_mul, |a, b| a * b)
    }

    /// Element-wise sum of two arrays of equal length.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::ShapeMismatch` if the lengths differ and
    /// `ValidationError::ForbiddenOperation` if either side is an enum array.
    pub fn add(&self, rhs: &Self) -> Result<Self, ValidationError> {
        forbid_enum("add", self.value_type())?;
        forbid_enum("add", rhs.value_type())?;
        if self.len() != rhs.len() {
            return Err(ValidationError::ShapeMismatch {
                left: self.len(),
                right: rhs.len(),
            });
        }
        if self.is_integral() && rhs.is_integral() {
            let left = self.cast(ValueType::Int);
            let right = rhs.cast(ValueType::Int);
            if let (Self::Int(a), Self::Int(b)) = (left, right) {
                return Ok(Self::Int(
                    a.iter().zip(&b).map(|(x, y)| x.saturating_add(*y)).collect(),
                ));
            }
        }
        Ok(Self::Float(
            self.to_f64()
                .iter()
                .zip(rhs.to_f64())
                .map(|(x, y)| x + y)
                .collect(),
        ))
    }

    /// Boolean array, true where the element equals `rhs`.
    #[must_use]
    pub fn eq_value(&self, rhs: Value) -> Self {
        Self::Bool(self.iter().map(|v| v.same_as(&rhs)).collect())
    }

    /// Boolean array, true where the element differs from `rhs`.
    #[must_use]
    pub fn ne_value(&self, rhs: Value) -> Self {
        Self::Bool(self.iter().map(|v| !v.same_as(&rhs)).collect())
    }

    fn is_integral(&self) -> bool {
        !matches!(self, Self::Float(_))
    }

    fn combine_scalar(
        &self,
        operation: &str,
        rhs: Value,
        int_op: fn(i64, i64) -> i64,
        float_op: fn(f64, f64) -> f64,
    ) -> Result<Self, ValidationError> {
        forbid_enum(operation, self.value_type())?;
        forbid_enum(operation, rhs.value_type())?;
        let rhs_integral = !matches!(rhs, Value::Float(_));
        if self.is_integral() && rhs_integral {
            if let (Self::Int(values), Value::Int(r)) =
                (self.cast(ValueType::Int), rhs.cast(ValueType::Int))
            {
                return Ok(Self::Int(values.into_iter().map(|v| int_op(v, r)).collect()));
            }
        }
        let r = rhs.as_f64();
        Ok(Self::Float(self.to_f64().into_iter().map(|v| float_op(v, r)).collect()))
    }
}

fn forbid_enum(operation: &str, value_type: ValueType) -> Result<(), ValidationError> {
    if value_type == ValueType::Enum {
        return Err(ValidationError::ForbiddenOperation {
            operation: operation.to_string(),
            value_type,
        });
    }
    Ok(())
}

impl From<Vec<bool>> for Array {
    fn from(v: Vec<bool>) -> Self {
        Self::Bool(v)
    }
}

impl From<Vec<i64>> for Array {
    fn from(v: Vec<i64>) -> Self {
        Self::Int(v)
    }
}

impl From<Vec<f64>> for Array {
    fn from(v: Vec<f64>) -> Self {
        Self::Float(v)
    }
}

/// What a formula hands back to the evaluator.
#[derive(Debug, Clone, PartialEq)]
pub enum FormulaOutput {
    /// One value per population member.
    Array(Array),
    /// A single value, broadcast to the population size.
    Scalar(Value),
}

impl FormulaOutput {
    /// Broadcasts scalars and casts to `value_type`, checking the final length.
    pub(crate) fn into_array(
        self,
        variable: &str,
        value_type: ValueType,
        size: usize,
    ) -> Result<Array, ValidationError> {
        let array = match self {
            Self::Scalar(value) => Array::filled(value.cast(value_type), size),
            Self::Array(array) => array.cast(value_type),
        };
        if array.len() != size {
            return Err(ValidationError::ArrayLength {
                variable: variable.to_string(),
                expected: size,
                actual: array.len(),
            });
        }
        Ok(array)
    }
}

impl From<Array> for FormulaOutput {
    fn from(v: Array) -> Self {
        Self::Array(v)
    }
}

impl From<Value> for FormulaOutput {
    fn from(v: Value) -> Self {
        Self::Scalar(v)
    }
}

impl From<bool> for FormulaOutput {
    fn from(v: bool) -> Self {
        Self::Scalar(Value::Bool(v))
    }
}

impl From<i64> for FormulaOutput {
    fn from(v: i64) -> Self {
        Self::Scalar(Value::Int(v))
    }
}

impl From<f64> for FormulaOutput {
    fn from(v: f64) -> Self {
        Self::Scalar(Value::Float(v))
    }
}
