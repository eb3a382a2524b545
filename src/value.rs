use core::fmt::{self, Display, Formatter};
use std::borrow::Cow;

/// Prop values by name.
///
/// Iteration order is unspecified, which is also the order in which a change set is applied.
pub type Props = hashbrown::HashMap<String, Value>;

/// A prop value.
///
/// Text and attribute placeholders display it, actions receive it as-is.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
	Null,
	Bool(bool),
	Int(i64),
	Float(f64),
	Str(Cow<'static, str>),
}

impl Default for Value {
	fn default() -> Self {
		Self::Null
	}
}

impl Value {
	/// The text a text node bound to this value contains.
	#[must_use]
	pub fn to_text(&self) -> Cow<'_, str> {
		match self {
			Value::Null => Cow::Borrowed(""),
			Value::Str(str) => Cow::Borrowed(str),
			other => Cow::Owned(other.to_string()),
		}
	}

	#[must_use]
	pub fn as_str(&self) -> Option<&str> {
		match self {
			Value::Str(str) => Some(str),
			_ => None,
		}
	}

	#[must_use]
	pub fn is_null(&self) -> bool {
		matches!(self, Value::Null)
	}
}

impl Display for Value {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Value::Null => Ok(()),
			Value::Bool(bool) => Display::fmt(bool, f),
			Value::Int(int) => Display::fmt(int, f),
			Value::Float(float) => Display::fmt(float, f),
			Value::Str(str) => f.write_str(str),
		}
	}
}

impl From<&'static str> for Value {
	fn from(str: &'static str) -> Self {
		Self::Str(Cow::Borrowed(str))
	}
}

impl From<String> for Value {
	fn from(string: String) -> Self {
		Self::Str(Cow::Owned(string))
	}
}

impl From<Cow<'static, str>> for Value {
	fn from(cow: Cow<'static, str>) -> Self {
		Self::Str(cow)
	}
}

impl From<bool> for Value {
	fn from(bool: bool) -> Self {
		Self::Bool(bool)
	}
}

impl From<f64> for Value {
	fn from(float: f64) -> Self {
		Self::Float(float)
	}
}

impl<T: Into<Value>> From<Option<T>> for Value {
	fn from(option: Option<T>) -> Self {
		option.map_or(Self::Null, Into::into)
	}
}

macro_rules! impl_from_int {
	($($int:ty),*) => {
		$(
			impl From<$int> for Value {
				fn from(int: $int) -> Self {
					Self::Int(int.into())
				}
			}
		)*
	};
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

/// Formats a value for log fields, honouring the `dangerous-logging` feature.
pub(crate) fn loggable(value: &Value) -> &dyn fmt::Debug {
	if cfg!(feature = "dangerous-logging") {
		value
	} else {
		&"<redacted>"
	}
}

/// Builds [`Props`] from `name => value` pairs.
///
/// ```
/// use micro_component::{props, Value};
///
/// let props = props! { "hello" => "bye", "count" => 3 };
/// assert_eq!(props["count"], Value::Int(3));
/// ```
#[macro_export]
macro_rules! props {
	($($name:expr => $value:expr),* $(,)?) => {{
		#[allow(unused_mut)]
		let mut props = $crate::Props::new();
		$(props.insert(::std::string::String::from($name), $crate::Value::from($value));)*
		props
	}};
}
