//! Converts any `Serialize` type into a [`QueryValue`] tree.

use serde::ser;

use crate::error::*;
use crate::value::{Number, QueryValue};

use std::collections::BTreeMap;

/// Converts a value into a [`QueryValue`].
///
/// Any shape is accepted here; the top-level mapping requirement is only
/// checked when the value is encoded.
///
/// ```
/// use canonical_qs::{QueryValue, to_value};
/// use std::collections::BTreeMap;
///
/// let value = to_value(&BTreeMap::from([("page", 5)])).unwrap();
/// let expected: QueryValue = [("page", 5)].into_iter().collect();
/// assert_eq!(value, expected);
/// ```
pub fn to_value<T: ser::Serialize + ?Sized>(input: &T) -> Result<QueryValue> {
    crate::Config::default().to_value(input)
}

/// A serializer that builds a [`QueryValue`].
///
/// The serializer tracks how deep it is so that containers nested beyond
/// `max_depth` are rejected. The top-level value sits at depth 0.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ValueSerializer {
    depth: usize,
    max_depth: usize,
}

impl ValueSerializer {
    pub(crate) fn new(max_depth: usize) -> Self {
        Self {
            depth: 0,
            max_depth,
        }
    }

    /// Returns the serializer for the children of a container at this depth.
    fn nested(self) -> Result<Self> {
        if self.depth > self.max_depth {
            return Err(Error::MaxDepthExceeded(self.max_depth));
        }
        Ok(Self {
            depth: self.depth + 1,
            max_depth: self.max_depth,
        })
    }
}

macro_rules! serialize_unsigned {
    (
        $($ty:ty => $meth:ident,)*) => {
        $(
            fn $meth(self, v: $ty) -> Result<Self::Ok> {
                Ok(QueryValue::Number(Number::PosInt(u64::from(v))))
            }
        )*
    };
}

macro_rules! serialize_signed {
    (
        $($ty:ty => $meth:ident,)*) => {
        $(
            fn $meth(self, v: $ty) -> Result<Self::Ok> {
                Ok(QueryValue::from(i64::from(v)))
            }
        )*
    };
}

fn float(v: f64) -> Result<QueryValue> {
    if v.is_finite() {
        Ok(QueryValue::Number(Number::Float(v)))
    } else {
        Err(Error::unsupported(format_args!("non-finite number {v}")))
    }
}

impl ser::Serializer for ValueSerializer {
    type Ok = QueryValue;
    type Error = Error;
    type SerializeSeq = SerializeVec;
    type SerializeTuple = SerializeVec;
    type SerializeTupleStruct = SerializeVec;
    type SerializeTupleVariant = SerializeTupleVariant;
    type SerializeMap = SerializeMap;
    type SerializeStruct = SerializeMap;
    type SerializeStructVariant = SerializeStructVariant;

    serialize_unsigned! {
        u8  => serialize_u8,
        u16 => serialize_u16,
        u32 => serialize_u32,
        u64 => serialize_u64,
    }
    serialize_signed! {
        i8  => serialize_i8,
        i16 => serialize_i16,
        i32 => serialize_i32,
        i64 => serialize_i64,
    }

    fn serialize_u128(self, v: u128) -> Result<Self::Ok> {
        u64::try_from(v)
            .map(QueryValue::from)
            .map_err(|_| Error::unsupported(format_args!("integer {v} out of range")))
    }

    fn serialize_i128(self, v: i128) -> Result<Self::Ok> {
        i64::try_from(v)
            .map(QueryValue::from)
            .map_err(|_| Error::unsupported(format_args!("integer {v} out of range")))
    }

    fn serialize_f32(self, v: f32) -> Result<Self::Ok> {
        float(f64::from(v))
    }

    fn serialize_f64(self, v: f64) -> Result<Self::Ok> {
        float(v)
    }

    fn serialize_bool(self, v: bool) -> Result<Self::Ok> {
        Ok(QueryValue::Bool(v))
    }

    fn serialize_char(self, v: char) -> Result<Self::Ok> {
        Ok(QueryValue::String(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<Self::Ok> {
        Ok(QueryValue::String(v.to_owned()))
    }

    /// Returns an error.
    fn serialize_bytes(self, _value: &[u8]) -> Result<Self::Ok> {
        Err(Error::unsupported("raw bytes"))
    }

    fn serialize_none(self) -> Result<Self::Ok> {
        Ok(QueryValue::Null)
    }

    fn serialize_some<T: ?Sized + ser::Serialize>(self, value: &T) -> Result<Self::Ok> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Self::Ok> {
        Ok(QueryValue::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Self::Ok> {
        Ok(QueryValue::Null)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Self::Ok> {
        Ok(QueryValue::String(variant.to_owned()))
    }

    fn serialize_newtype_struct<T: ?Sized + ser::Serialize>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<Self::Ok> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + ser::Serialize>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Self::Ok> {
        let inner = value.serialize(self.nested()?)?;
        let mut map = BTreeMap::new();
        map.insert(variant.to_owned(), inner);
        Ok(QueryValue::Map(map))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<Self::SerializeSeq> {
        Ok(SerializeVec {
            ser: self.nested()?,
            items: Vec::with_capacity(len.unwrap_or(0)),
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<Self::SerializeTuple> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        // the variant map occupies one level, the sequence another
        let inner = self.nested()?;
        Ok(SerializeTupleVariant {
            variant,
            vec: inner.serialize_seq(Some(len))?,
        })
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        Ok(SerializeMap {
            ser: self.nested()?,
            map: BTreeMap::new(),
            next_key: None,
        })
    }

    fn serialize_struct(self, _name: &'static str, len: usize) -> Result<Self::SerializeStruct> {
        self.serialize_map(Some(len))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        let inner = self.nested()?;
        Ok(SerializeStructVariant {
            variant,
            map: inner.serialize_map(Some(len))?,
        })
    }
}

pub(crate) struct SerializeVec {
    ser: ValueSerializer,
    items: Vec<QueryValue>,
}

impl ser::SerializeSeq for SerializeVec {
    type Ok = QueryValue;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ser::Serialize + ?Sized,
    {
        self.items.push(value.serialize(self.ser)?);
        Ok(())
    }

    fn end(self) -> Result<Self::Ok> {
        Ok(QueryValue::Array(self.items))
    }
}

impl ser::SerializeTuple for SerializeVec {
    type Ok = QueryValue;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ser::Serialize + ?Sized,
    {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Self::Ok> {
        ser::SerializeSeq::end(self)
    }
}

impl ser::SerializeTupleStruct for SerializeVec {
    type Ok = QueryValue;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ser::Serialize + ?Sized,
    {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Self::Ok> {
        ser::SerializeSeq::end(self)
    }
}

pub(crate) struct SerializeTupleVariant {
    variant: &'static str,
    vec: SerializeVec,
}

impl ser::SerializeTupleVariant for SerializeTupleVariant {
    type Ok = QueryValue;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ser::Serialize + ?Sized,
    {
        ser::SerializeSeq::serialize_element(&mut self.vec, value)
    }

    fn end(self) -> Result<Self::Ok> {
        let mut map = BTreeMap::new();
        map.insert(self.variant.to_owned(), ser::SerializeSeq::end(self.vec)?);
        Ok(QueryValue::Map(map))
    }
}

pub(crate) struct SerializeMap {
    ser: ValueSerializer,
    map: BTreeMap<String, QueryValue>,
    next_key: Option<String>,
}

impl ser::SerializeMap for SerializeMap {
    type Ok = QueryValue;
    type Error = Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: ser::Serialize + ?Sized,
    {
        self.next_key = Some(key.serialize(KeySerializer)?);
        Ok(())
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: ser::Serialize + ?Sized,
    {
        let Some(key) = self.next_key.take() else {
            return Err(Error::Custom(
                "internal error: value serialized before its key".to_string(),
            ));
        };
        let value = value.serialize(self.ser)?;
        self.map.insert(key, value);
        Ok(())
    }

    fn end(self) -> Result<Self::Ok> {
        Ok(QueryValue::Map(self.map))
    }
}

impl ser::SerializeStruct for SerializeMap {
    type Ok = QueryValue;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ser::Serialize + ?Sized,
    {
        let value = value.serialize(self.ser)?;
        self.map.insert(key.to_owned(), value);
        Ok(())
    }

    fn end(self) -> Result<Self::Ok> {
        ser::SerializeMap::end(self)
    }
}

pub(crate) struct SerializeStructVariant {
    variant: &'static str,
    map: SerializeMap,
}

impl ser::SerializeStructVariant for SerializeStructVariant {
    type Ok = QueryValue;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ser::Serialize + ?Sized,
    {
        ser::SerializeStruct::serialize_field(&mut self.map, key, value)
    }

    fn end(self) -> Result<Self::Ok> {
        let mut map = BTreeMap::new();
        map.insert(self.variant.to_owned(), ser::SerializeMap::end(self.map)?);
        Ok(QueryValue::Map(map))
    }
}

macro_rules! serialize_key_itoa {
    (
        $($ty:ty => $meth:ident,)*) => {
        $(
            fn $meth(self, v: $ty) -> Result<Self::Ok> {
                let mut buffer = itoa::Buffer::new();
                Ok(buffer.format(v).to_owned())
            }
        )*
    };
}

/// Renders map keys to the string they will be written as.
struct KeySerializer;

impl KeySerializer {
    fn unsupported(what: &str) -> Error {
        Error::unsupported(format_args!("{what} as a map key"))
    }
}

impl ser::Serializer for KeySerializer {
    type Ok = String;
    type Error = Error;
    type SerializeSeq = ser::Impossible<Self::Ok, Error>;
    type SerializeTuple = ser::Impossible<Self::Ok, Error>;
    type SerializeTupleStruct = ser::Impossible<Self::Ok, Error>;
    type SerializeTupleVariant = ser::Impossible<Self::Ok, Error>;
    type SerializeMap = ser::Impossible<Self::Ok, Error>;
    type SerializeStruct = ser::Impossible<Self::Ok, Error>;
    type SerializeStructVariant = ser::Impossible<Self::Ok, Error>;

    serialize_key_itoa! {
        u8  => serialize_u8,
        u16 => serialize_u16,
        u32 => serialize_u32,
        u64 => serialize_u64,
        u128 => serialize_u128,
        i8  => serialize_i8,
        i16 => serialize_i16,
        i32 => serialize_i32,
        i64 => serialize_i64,
        i128 => serialize_i128,
    }

    fn serialize_f32(self, v: f32) -> Result<Self::Ok> {
        self.serialize_f64(f64::from(v))
    }

    fn serialize_f64(self, v: f64) -> Result<Self::Ok> {
        match float(v)? {
            QueryValue::Number(n) => Ok(n.to_string()),
            other => Err(Self::unsupported(other.kind())),
        }
    }

    fn serialize_bool(self, v: bool) -> Result<Self::Ok> {
        Ok(if v { "true" } else { "false" }.to_owned())
    }

    fn serialize_char(self, v: char) -> Result<Self::Ok> {
        Ok(v.to_string())
    }

    fn serialize_str(self, v: &str) -> Result<Self::Ok> {
        Ok(v.to_owned())
    }

    /// Returns an error.
    fn serialize_bytes(self, _value: &[u8]) -> Result<Self::Ok> {
        Err(Self::unsupported("raw bytes"))
    }

    /// Returns an error.
    fn serialize_none(self) -> Result<Self::Ok> {
        Err(Self::unsupported("none"))
    }

    fn serialize_some<T: ?Sized + ser::Serialize>(self, value: &T) -> Result<Self::Ok> {
        value.serialize(self)
    }

    /// Returns an error.
    fn serialize_unit(self) -> Result<Self::Ok> {
        Err(Self::unsupported("unit"))
    }

    /// Returns an error.
    fn serialize_unit_struct(self, _name: &'static str) -> Result<Self::Ok> {
        Err(Self::unsupported("unit struct"))
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Self::Ok> {
        Ok(variant.to_owned())
    }

    fn serialize_newtype_struct<T: ?Sized + ser::Serialize>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<Self::Ok> {
        value.serialize(self)
    }

    /// Returns an error.
    fn serialize_newtype_variant<T: ?Sized + ser::Serialize>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<Self::Ok> {
        Err(Self::unsupported("enum variant with data"))
    }

    /// Returns an error.
    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq> {
        Err(Self::unsupported("sequence"))
    }

    /// Returns an error.
    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple> {
        Err(Self::unsupported("tuple"))
    }

    /// Returns an error.
    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        Err(Self::unsupported("tuple struct"))
    }

    /// Returns an error.
    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        Err(Self::unsupported("enum variant with data"))
    }

    /// Returns an error.
    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        Err(Self::unsupported("map"))
    }

    /// Returns an error.
    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeStruct> {
        Err(Self::unsupported("struct"))
    }

    /// Returns an error.
    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        Err(Self::unsupported("enum variant with data"))
    }
}
