use crate::claims::PermissionSet;
use crate::error::AuthError;

/// Allows only when `required` is literally present in `granted`.
///
/// No prefix, hierarchy or wildcard matching: `get:movies` does not satisfy `get:movies:all`
/// and `*` is just another string.
pub fn enforce(granted: &PermissionSet, required: &str) -> Result<(), AuthError> {
    if granted.contains(required) {
        Ok(())
    } else {
        Err(AuthError::PermissionDenied(required.to_string()))
    }
}
