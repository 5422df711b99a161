//! Emulator failures, shaped like the real service's status and error codes.

use crate::retry::RemoteError;

impl From<sqlx::Error> for RemoteError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::PoolTimedOut => {
                RemoteError::with_status(503, "ServerBusy", "emulator connection pool timed out")
            }
            // No status: the classifier looks at the io::Error in the chain.
            sqlx::Error::Io(io) => RemoteError::new("emulator I/O failure").with_source(io),
            other => {
                if let Some(db) = other.as_database_error() {
                    if db.is_unique_violation() {
                        return RemoteError::with_status(
                            409,
                            "ResourceAlreadyExists",
                            db.message().to_owned(),
                        );
                    }
                }
                RemoteError::with_status(500, "InternalError", "emulator storage failure")
                    .with_source(other)
            }
        }
    }
}

pub(crate) fn not_found(code: &str, what: impl std::fmt::Display) -> RemoteError {
    RemoteError::with_status(404, code, format!("{what} does not exist"))
}

pub(crate) fn already_exists(code: &str, what: impl std::fmt::Display) -> RemoteError {
    RemoteError::with_status(409, code, format!("{what} already exists"))
}

pub(crate) fn condition_not_met(what: impl std::fmt::Display) -> RemoteError {
    RemoteError::with_status(
        412,
        "UpdateConditionNotSatisfied",
        format!("{what}: the ETag does not match"),
    )
}

pub(crate) fn invalid_input(code: &str, message: impl Into<String>) -> RemoteError {
    RemoteError::with_status(400, code, message)
}

/// Container, queue and share names: 3-63 chars of lowercase letters,
/// digits and single hyphens, starting and ending with a letter or digit.
pub(crate) fn check_dns_name(kind: &str, name: &str) -> Result<(), RemoteError> {
    let ok = (3..=63).contains(&name.len())
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !name.starts_with('-')
        && !name.ends_with('-')
        && !name.contains("--");
    if ok {
        Ok(())
    } else {
        Err(invalid_input(
            "InvalidResourceName",
            format!("invalid {kind} name '{name}'"),
        ))
    }
}

/// Table names: 3-63 alphanumeric chars, starting with a letter.
pub(crate) fn check_table_name(name: &str) -> Result<(), RemoteError> {
    let ok = (3..=63).contains(&name.len())
        && name.chars().all(|c| c.is_ascii_alphanumeric())
        && name.starts_with(|c: char| c.is_ascii_alphabetic());
    if ok {
        Ok(())
    } else {
        Err(invalid_input(
            "InvalidResourceName",
            format!("invalid table name '{name}'"),
        ))
    }
}

/// Entity keys may not contain `/`, `\`, `#` or `?`.
pub(crate) fn check_entity_key(which: &str, key: &str) -> Result<(), RemoteError> {
    if key.len() > 1024 || key.contains(['/', '\\', '#', '?']) {
        return Err(invalid_input(
            "InvalidInput",
            format!("{which} '{key}' contains a forbidden character or is too long"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::RemoteFailure;

    #[test]
    fn dns_names() {
        assert!(check_dns_name("container", "photos-2024").is_ok());
        for bad in ["ab", "Photos", "-abc", "abc-", "a--b", "a_b"] {
            let e = check_dns_name("container", bad).unwrap_err();
            assert_eq!(e.status_code(), Some(400), "{bad}");
        }
    }

    #[test]
    fn table_names() {
        assert!(check_table_name("Customers2").is_ok());
        assert!(check_table_name("2customers").is_err());
        assert!(check_table_name("cust-omers").is_err());
    }

    #[test]
    fn entity_keys() {
        assert!(check_entity_key("RowKey", "a b c").is_ok());
        assert!(check_entity_key("RowKey", "a/b").is_err());
        assert!(check_entity_key("PartitionKey", "x#1").is_err());
    }

    #[test]
    fn pool_timeout_is_server_busy() {
        let e = RemoteError::from(sqlx::Error::PoolTimedOut);
        assert_eq!(e.status_code(), Some(503));
        assert_eq!(e.error_code(), Some("ServerBusy"));
    }
}
