//! Enumerated value sets.
//!
//! An `Enumeration` names the possible values of an enum-typed variable.
//! Arrays of such variables store member indices (`Array::Enum`); the
//! enumeration translates between names and indices and answers membership
//! tests. Only equality comparisons are defined on enum arrays.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::value::{Array, Value};

/// The ordered set of possible values of an enum variable.
///
/// # Examples
///
/// ```
/// use lazycalc::Enumeration;
///
/// let housing = Enumeration::new("housing", ["tenant", "owner", "free_lodger"])
///     .unwrap()
///     .with_default("tenant")
///     .unwrap();
/// let array = housing.encode(&["owner", "tenant"]).unwrap();
/// assert_eq!(housing.decode(&array).unwrap(), vec!["owner", "tenant"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawEnumeration")]
pub struct Enumeration {
    name: String,
    members: Vec<String>,
    default: u16,
}

#[derive(Deserialize)]
struct RawEnumeration {
    name: String,
    members: Vec<String>,
    default: u16,
}

impl TryFrom<RawEnumeration> for Enumeration {
    type Error = ValidationError;

    fn try_from(raw: RawEnumeration) -> Result<Self, Self::Error> {
        let mut enumeration = Self::new(raw.name, raw.members)?;
        if enumeration.member(raw.default).is_none() {
            return Err(enumeration.invalid(format!("default index {} is out of range", raw.default)));
        }
        enumeration.default = raw.default;
        Ok(enumeration)
    }
}

impl Enumeration {
    /// Creates an enumeration. The first member is the default.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidEnum` if there are no members, a
    /// member is blank or repeated, or there are more members than indices.
    pub fn new<I, S>(name: impl Into<String>, members: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        let members: Vec<String> = members.into_iter().map(Into::into).collect();
        let fail = |reason: String| ValidationError::InvalidEnum {
            name: name.clone(),
            reason,
        };
        if members.is_empty() {
            return Err(fail("no members".to_string()));
        }
        if members.len() > usize::from(u16::MAX) {
            return Err(fail(format!("{} members, at most {}", members.len(), u16::MAX)));
        }
        let mut seen = HashSet::with_capacity(members.len());
        for member in &members {
            if member.trim().is_empty() {
                return Err(fail("blank member name".to_string()));
            }
            if !seen.insert(member.as_str()) {
                return Err(fail(format!("member '{member}' is repeated")));
            }
        }
        Ok(Self {
            name,
            members,
            default: 0,
        })
    }

    /// Sets the member used for missing inputs and spiral defaults.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidEnum` if `member` is not a member.
    pub fn with_default(mut self, member: &str) -> Result<Self, ValidationError> {
        self.default = self.index_of(member)?;
        Ok(self)
    }

    /// Enumeration name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Member names in index order.
    #[must_use]
    pub fn members(&self) -> &[String] {
        &self.members
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Always false; enumerations have at least one member.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Index of `member`.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidEnum` for unknown names.
    pub fn index_of(&self, member: &str) -> Result<u16, ValidationError> {
        self.members
            .iter()
            .position(|m| m == member)
            .and_then(|idx| u16::try_from(idx).ok())
            .ok_or_else(|| self.invalid(format!("'{member}' is not a member")))
    }

    /// Name of the member at `index`, if any.
    #[must_use]
    pub fn member(&self, index: u16) -> Option<&str> {
        self.members.get(usize::from(index)).map(String::as_str)
    }

    /// Index of the default member.
    #[must_use]
    pub const fn default_index(&self) -> u16 {
        self.default
    }

    /// Name of the default member.
    #[must_use]
    pub fn default_member(&self) -> &str {
        self.member(self.default).unwrap_or_default()
    }

    /// The default member as a scalar.
    #[must_use]
    pub const fn default_value(&self) -> Value {
        Value::Enum(self.default)
    }

    /// The scalar for `member`.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidEnum` for unknown names.
    pub fn value(&self, member: &str) -> Result<Value, ValidationError> {
        self.index_of(member).map(Value::Enum)
    }

    /// Encodes member names into an index array.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidEnum` on the first unknown name.
    pub fn encode<S: AsRef<str>>(&self, names: &[S]) -> Result<Array, ValidationError> {
        names
            .iter()
            .map(|name| self.index_of(name.as_ref()))
            .collect::<Result<Vec<_>, _>>()
            .map(Array::Enum)
    }

    /// Decodes an index array into member names.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidEnum` if `array` is not an enum array
    /// or holds an index outside the enumeration.
    pub fn decode<'a>(&'a self, array: &Array) -> Result<Vec<&'a str>, ValidationError> {
        let Array::Enum(indices) = array else {
            return Err(self.invalid(format!("cannot decode a {} array", array.value_type())));
        };
        indices
            .iter()
            .map(|&idx| {
                self.member(idx)
                    .ok_or_else(|| self.invalid(format!("index {idx} is out of range")))
            })
            .collect()
    }

    /// Checks that every index of `array` names a member.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidEnum` naming `variable` otherwise.
    pub fn check(&self, variable: &str, array: &Array) -> Result<(), ValidationError> {
        let Array::Enum(indices) = array else {
            return Ok(());
        };
        match indices.iter().find(|&&idx| usize::from(idx) >= self.len()) {
            Some(idx) => Err(ValidationError::InvalidEnum {
                name: variable.to_string(),
                reason: format!("index {idx} is not a member of '{}'", self.name),
            }),
            None => Ok(()),
        }
    }

    /// Boolean array, true where `array` holds `member`.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidEnum` for unknown names.
    pub fn matches(&self, array: &Array, member: &str) -> Result<Array, ValidationError> {
        Ok(array.eq_value(self.value(member)?))
    }

    fn invalid(&self, reason: String) -> ValidationError {
        ValidationError::InvalidEnum {
            name: self.name.clone(),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn housing() -> Enumeration {
        Enumeration::new("housing", ["tenant", "owner", "free_lodger", "homeless"]).unwrap()
    }

    #[test]
    fn test_new_validates_members() {
        assert!(Enumeration::new("empty", Vec::<String>::new()).is_err());
        assert!(Enumeration::new("dup", ["a", "b", "a"]).is_err());
        assert!(Enumeration::new("blank", ["a", " "]).is_err());
        let ok = housing();
        assert_eq!(ok.len(), 4);
        assert_eq!(ok.default_member(), "tenant");
        assert_eq!(ok.default_value(), Value::Enum(0));
    }

    #[test]
    fn test_with_default() {
        let owner = housing().with_default("owner").unwrap();
        assert_eq!(owner.default_index(), 1);
        assert_eq!(owner.default_member(), "owner");
        assert!(housing().with_default("landlord").is_err());
    }

    #[test]
    fn test_encode_decode() {
        let enumeration = housing();
        let array = enumeration.encode(&["owner", "homeless", "tenant"]).unwrap();
        assert_eq!(array, Array::Enum(vec![1, 3, 0]));
        assert_eq!(
            enumeration.decode(&array).unwrap(),
            vec!["owner", "homeless", "tenant"]
        );
        assert!(enumeration.encode(&["castle"]).is_err());
        assert!(enumeration.decode(&Array::Enum(vec![9])).is_err());
        assert!(enumeration.decode(&Array::from(vec![1_i64])).is_err());
    }

    #[test]
    fn test_check_rejects_out_of_range_indices() {
        let enumeration = housing();
        assert!(enumeration.check("housing_occupancy_status", &Array::Enum(vec![0, 3])).is_ok());
        let err = enumeration
            .check("housing_occupancy_status", &Array::Enum(vec![0, 4]))
            .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidEnum { ref name, .. } if name == "housing_occupancy_status"));
    }

    #[test]
    fn test_matches_member() {
        let enumeration = housing();
        let array = enumeration.encode(&["tenant", "owner", "tenant"]).unwrap();
        assert_eq!(
            enumeration.matches(&array, "tenant").unwrap(),
            Array::from(vec![true, false, true])
        );
        assert!(enumeration.matches(&array, "castle").is_err());
    }

    #[test]
    fn test_enumeration_serialization() {
        let enumeration = housing().with_default("owner").unwrap();
        let json = serde_json::to_string(&enumeration).unwrap();
        let back: Enumeration = serde_json::from_str(&json).unwrap();
        assert_eq!(back, enumeration);

        let bad = r#"{"name":"housing","members":["tenant"],"default":3}"#;
        assert!(serde_json::from_str::<Enumeration>(bad).is_err());
    }
}
