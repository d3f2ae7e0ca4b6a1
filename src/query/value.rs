use std::fmt;

/// Value side of a query predicate
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Integer(i64),
    Unsigned(u64),
    Float(f64),
    /// No value: the predicate tests for the key's presence
    Absent,
}

impl Value {
    /// Numeric values are compared as numbers by the store
    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Unsigned(_) | Value::Float(_))
    }

    /// The string submitted to the store, `None` for an absent value.
    ///
    /// Floats use Rust's shortest round-trip `Display`: never exponent
    /// notation, so `1e21` renders as `1000000000000000000000`, and
    /// non-finite values render as `inf`, `-inf` and `NaN`.
    pub fn render(&self) -> Option<String> {
        match self {
            Value::Absent => None,
            other => Some(other.to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => f.write_str(s),
            Value::Integer(n) => write!(f, "{}", n),
            Value::Unsigned(n) => write!(f, "{}", n),
            Value::Float(n) => write!(f, "{}", n),
            Value::Absent => Ok(()),
        }
    }
}

macro_rules! impl_from_integer {
    ($variant:ident, $target:ty, $($source:ty),+) => {
        $(
            impl From<$source> for Value {
                fn from(value: $source) -> Self {
                    Value::$variant(value as $target)
                }
            }
        )+
    };
}

impl_from_integer!(Integer, i64, i8, i16, i32, i64, isize);
impl_from_integer!(Unsigned, u64, u8, u16, u32, u64, usize);

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        // Widen through the shortest decimal form so 0.1f32 renders as "0.1"
        let widened = value.to_string().parse().unwrap_or(f64::from(value));
        Value::Float(widened)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Text(value.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Absent, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_variants() {
        assert_eq!(Value::from(3i32), Value::Integer(3));
        assert_eq!(Value::from(-7i8), Value::Integer(-7));
        assert_eq!(Value::from(u64::MAX), Value::Unsigned(u64::MAX));
        assert_eq!(Value::from(2.5f64), Value::Float(2.5));
        assert!(Value::from(1u16).is_numeric());
        assert!(!Value::from("3").is_numeric());
        assert!(!Value::Absent.is_numeric());
    }

    #[test]
    fn test_render() {
        assert_eq!(Value::from(3).render().as_deref(), Some("3"));
        assert_eq!(Value::from(u64::MAX).render().as_deref(), Some("18446744073709551615"));
        assert_eq!(Value::from(0.1f32).render().as_deref(), Some("0.1"));
        assert_eq!(Value::from(3.0f64).render().as_deref(), Some("3"));
        assert_eq!(Value::from("boot").render().as_deref(), Some("boot"));
        assert_eq!(Value::from(true).render().as_deref(), Some("true"));
        assert_eq!(Value::Absent.render(), None);
    }

    #[test]
    fn test_render_extreme_floats() {
        assert_eq!(Value::from(1e21).render().as_deref(), Some("1000000000000000000000"));
        assert_eq!(Value::from(1e-7).render().as_deref(), Some("0.0000001"));
        assert_eq!(Value::from(f64::INFINITY).render().as_deref(), Some("inf"));
        assert_eq!(Value::from(f64::NEG_INFINITY).render().as_deref(), Some("-inf"));
        assert_eq!(Value::from(f64::NAN).render().as_deref(), Some("NaN"));
        assert!(Value::from(f64::NAN).is_numeric());
    }

    #[test]
    fn test_option_maps_none_to_absent() {
        assert_eq!(Value::from(None::<i32>), Value::Absent);
        assert_eq!(Value::from(Some("x")), Value::Text("x".to_string()));
    }
}
