//! Content encoding.
//!
//! Scalars (`bool`, integers, floats, `char`, `String`, `BigDecimal`) are stored
//! as their plain textual form. Everything else goes through a structured
//! `Codec`; `Json<T>` wires any serde type to the default `JsonCodec`.
//! Which path a type takes is fixed at compile time by its `Content` impl.

use bigdecimal::BigDecimal;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::str::FromStr;

/// A value that can be persisted as the text content of a dual-location file.
pub trait Content: Sized {
    fn encode(&self) -> Result<String, String>;
    fn decode(text: &str) -> Result<Self, String>;
}

/// Pluggable structured serializer for non-scalar payloads.
pub trait Codec {
    fn to_text<T: Serialize>(value: &T) -> Result<String, String>;
    fn from_text<T: DeserializeOwned>(text: &str) -> Result<T, String>;
}

/// serde_json-backed codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn to_text<T: Serialize>(value: &T) -> Result<String, String> {
        serde_json::to_string(value).map_err(|e| e.to_string())
    }

    fn from_text<T: DeserializeOwned>(text: &str) -> Result<T, String> {
        serde_json::from_str(text).map_err(|e| e.to_string())
    }
}

/// Store `T` as JSON through the regular `Content` entry points.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Json<T>(pub T);

impl<T> Json<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T: Serialize + DeserializeOwned> Content for Json<T> {
    fn encode(&self) -> Result<String, String> {
        JsonCodec::to_text(&self.0)
    }

    fn decode(text: &str) -> Result<Self, String> {
        JsonCodec::from_text(text).map(Json)
    }
}

impl Content for String {
    fn encode(&self) -> Result<String, String> {
        Ok(self.clone())
    }

    fn decode(text: &str) -> Result<Self, String> {
        Ok(text.to_owned())
    }
}

fn parse_trimmed<T>(text: &str) -> Result<T, String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let trimmed = text.trim();
    trimmed
        .parse::<T>()
        .map_err(|e| format!("cannot parse {trimmed:?} as {}: {e}", std::any::type_name::<T>()))
}

macro_rules! textual_content {
    ($($t:ty),* $(,)?) => {
        $(
            impl Content for $t {
                fn encode(&self) -> Result<String, String> {
                    Ok(self.to_string())
                }

                fn decode(text: &str) -> Result<Self, String> {
                    parse_trimmed(text)
                }
            }
        )*
    };
}

textual_content!(
    bool, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, BigDecimal,
);

// char is not trimmed: a single space is a valid stored character.
impl Content for char {
    fn encode(&self) -> Result<String, String> {
        Ok(self.to_string())
    }

    fn decode(text: &str) -> Result<Self, String> {
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(format!("expected exactly one character, found {text:?}")),
        }
    }
}
