//! Reply decoding for the few sentinel and node commands we issue

use crate::error::{Result, SentinelError};
use redis::Value;

/// Decode a bulk or simple string reply element
pub(crate) fn to_string(value: &Value) -> Result<String> {
    match value {
        Value::BulkString(bytes) => String::from_utf8(bytes.clone()).map_err(|e| {
            SentinelError::UnexpectedReply(format!("string is not valid UTF-8: {}", e))
        }),
        Value::SimpleString(s) => Ok(s.clone()),
        other => Err(SentinelError::UnexpectedReply(format!(
            "expected a string, got {:?}",
            other
        ))),
    }
}

/// Decode the `[host, port]` reply of `SENTINEL get-master-addr-by-name`
/// into a dialable `host:port` string. IPv6 hosts are bracketed.
pub(crate) fn master_addr(value: &Value) -> Result<String> {
    let items = match value {
        Value::Array(items) => items,
        Value::Nil => {
            return Err(SentinelError::UnexpectedReply(
                "sentinel does not know this master".into(),
            ))
        }
        other => {
            return Err(SentinelError::UnexpectedReply(format!(
                "expected [host, port], got {:?}",
                other
            )))
        }
    };

    let [host, port] = items.as_slice() else {
        return Err(SentinelError::UnexpectedReply(format!(
            "expected 2 elements in master address, got {}",
            items.len()
        )));
    };

    let host = to_string(host)?;
    let port = to_string(port)?;
    port.parse::<u16>().map_err(|_| {
        SentinelError::UnexpectedReply(format!("invalid master port {:?}", port))
    })?;

    if host.contains(':') && !host.starts_with('[') {
        Ok(format!("[{}]:{}", host, port))
    } else {
        Ok(format!("{}:{}", host, port))
    }
}

/// Extract the role name, the first element of a `ROLE` reply
pub(crate) fn role_name(value: &Value) -> Result<String> {
    match value {
        Value::Array(items) => match items.first() {
            Some(first) => to_string(first),
            None => Err(SentinelError::UnexpectedReply("empty ROLE reply".into())),
        },
        other => Err(SentinelError::UnexpectedReply(format!(
            "expected an array from ROLE, got {:?}",
            other
        ))),
    }
}
