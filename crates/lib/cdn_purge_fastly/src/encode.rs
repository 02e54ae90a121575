use crate::PurgeError;
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use url::Url;

// path characters from https://github.com/servo/rust-url/blob/master/url/src/parser.rs,
// plus `%` so file names containing it reach the API unchanged, and `\`
// which the URL parser would turn into `/`.
const FRAGMENT: &AsciiSet = &CONTROLS.add(b' ').add(b'"').add(b'<').add(b'>').add(b'`');
const PURGE_PATH: &AsciiSet = &FRAGMENT
    .add(b'#')
    .add(b'?')
    .add(b'{')
    .add(b'}')
    .add(b'%')
    .add(b'\\');
const PATH_SEGMENT: &AsciiSet = &PURGE_PATH.add(b'/');

// `.` and `..` are resolved by the URL parser, encoded or not.
fn is_dot_segment(segment: &str) -> bool {
    matches!(segment, "." | "..")
}

/// Encode a changed file path for the `/purge/{path}` URL segment.
///
/// `/` separators are kept, a leading one is dropped. Paths with `.` or `..`
/// segments have no encoding that stays below `/purge/` and give `None`.
pub fn encode_purge_path(path: &str) -> Option<String> {
    let path = path.trim_start_matches('/');
    if path.split('/').any(is_dot_segment) {
        return None;
    }
    Some(utf8_percent_encode(path, PURGE_PATH).to_string())
}

/// Encode a value that has to stay a single path segment, `/` included.
pub fn encode_path_segment(segment: &str) -> Option<String> {
    if is_dot_segment(segment) {
        return None;
    }
    Some(utf8_percent_encode(segment, PATH_SEGMENT).to_string())
}

/// `{api_host}/service/{service}/purge/{path}`, with `service` already
/// encoded through [`encode_path_segment`].
// https://www.fastly.com/documentation/reference/api/purging/
pub(crate) fn purge_url(api_host: &Url, service: &str, path: &str) -> Result<Url, PurgeError> {
    let encoded = encode_purge_path(path).ok_or_else(|| PurgeError::InvalidPath {
        path: path.to_owned(),
    })?;

    api_host
        .join(&format!("/service/{service}/purge/{encoded}"))
        .map_err(|source| PurgeError::InvalidUrl {
            path: path.to_owned(),
            source,
        })
}
