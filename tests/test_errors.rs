use serde::Serialize;
use serde_json::json;

use canonical_qs::{self as qs, Config, Error};

#[test]
fn top_level_must_be_a_mapping() {
    assert!(matches!(
        qs::to_query_string(&5),
        Err(Error::TopLevel("number"))
    ));
    assert!(matches!(
        qs::to_query_string(&vec![1, 2]),
        Err(Error::TopLevel("sequence"))
    ));
    assert!(matches!(
        qs::to_query_string(&json!(null)),
        Err(Error::TopLevel("null"))
    ));
    assert!(matches!(
        qs::to_query_string_with_defaults(&json!({ "a": 1 }), &json!("a")),
        Err(Error::TopLevel("string"))
    ));
}

#[test]
fn rejects_non_finite_numbers() {
    #[derive(Serialize)]
    struct Query {
        ratio: f64,
    }
    let err = qs::to_query_string(&Query { ratio: f64::NAN }).unwrap_err();
    assert!(matches!(err, Error::Unsupported(_)));
    assert_eq!(err.to_string(), "unsupported value: non-finite number NaN");
}

#[test]
fn rejects_raw_bytes() {
    struct Bytes;
    impl Serialize for Bytes {
        fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.serialize_bytes(b"abc")
        }
    }

    #[derive(Serialize)]
    struct Query {
        data: Bytes,
    }
    assert!(matches!(
        qs::to_query_string(&Query { data: Bytes }),
        Err(Error::Unsupported(_))
    ));
}

#[test]
fn custom_errors_are_propagated() {
    struct Failing;
    impl Serialize for Failing {
        fn serialize<S: serde::Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("nope"))
        }
    }

    #[derive(Serialize)]
    struct Query {
        field: Failing,
    }
    let err = qs::to_query_string(&Query { field: Failing }).unwrap_err();
    assert!(matches!(err, Error::Custom(ref msg) if msg == "nope"));
}

#[test]
fn max_depth_is_enforced() {
    let deep = json!({ "a": { "b": { "c": { "d": 1 } } } });
    assert!(Config::new().max_depth(3).to_query_string(&deep).is_ok());
    assert!(matches!(
        Config::new().max_depth(2).to_query_string(&deep),
        Err(Error::MaxDepthExceeded(2))
    ));
}

#[test]
fn max_depth_applies_to_prebuilt_values() {
    let deep = qs::to_value(&json!({ "a": { "b": { "c": 1 } } })).unwrap();
    let flat = qs::to_value(&json!({ "a": 1 })).unwrap();

    let config = Config::new().max_depth(1);
    assert!(matches!(
        config.encode_value(&deep, None),
        Err(Error::MaxDepthExceeded(1))
    ));
    // the defaults are held to the same limit
    assert!(matches!(
        config.encode_value(&flat, Some(&deep)),
        Err(Error::MaxDepthExceeded(1))
    ));
    assert_eq!(Config::new().max_depth(2).encode_value(&deep, None).unwrap(), "a[b][c]=1");
}

#[test]
fn write_errors_are_io_errors() {
    struct Broken;
    impl std::io::Write for Broken {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("closed"))
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    assert!(matches!(
        qs::to_writer(&json!({ "a": 1 }), &mut Broken),
        Err(Error::Io(_))
    ));
}
