#[macro_export]
macro_rules! opt {
    (, $default:ident) => {
        $default
    };
    ($optional:expr, $default:ident) => {
        $optional
    };
}

#[macro_export]
macro_rules! params_internal {
    ($vec:ident, required, $key:expr, $val:expr) => {
        $vec.push(($key, $val.to_string()));
    };
    ($vec:ident, optional, $key:expr, $val:expr) => {
        if let Some(ref v) = $val {
            $vec.push(($key, v.to_string()));
        }
    };
    ($vec:ident, eq, $key:expr, $val:expr) => {
        $vec.push(($key, format!("eq.{}", $val)));
    };
}

/// Builds query params for the REST endpoints of the record store.
/// `required` and `optional` push the value as is, `eq` wraps it into an
/// equality filter (`column=eq.value`). Example:
/// ```ignore
/// let params = build_params! {
///     required select => "*",
///     eq post_id => post_id,
///     optional limit => limit,
/// };
/// ```
#[macro_export]
macro_rules! build_params {
    (
        $(
            $kind:ident $name:ident $( => $val:expr )?
        ),+ $(,)?
    ) => {
        {
            let mut params: Vec<(String, String)> = Vec::new();
            $(
                $crate::params_internal!(
                    params,
                    $kind,
                    stringify!($name).to_string(),
                    $crate::opt!($( $val )?, $name)
                );
            )+
            params
        }
    };
}
