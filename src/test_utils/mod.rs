#![allow(missing_docs)]

pub(crate) mod http;

pub(crate) use http::{
    assert_content_type, assert_error_field, get_test_server, get_test_state, parse_json_body,
};
