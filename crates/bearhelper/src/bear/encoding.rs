use std::borrow::Cow;

/// Characters a plain query encoder leaves alone but Bear needs escaped.
pub const EXTENDED_RESERVED: &str = ":/?#[]@!$&'()*+,;=";

/// Percent-encodes everything outside `A-Z a-z 0-9 - . _ ~`.
pub fn encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Inverse of [`encode`]. `+` is kept literally. Invalid UTF-8 is replaced lossily.
pub fn decode(value: &str) -> String {
    match urlencoding::decode(value) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => {
            let bytes = urlencoding::decode_binary(value.as_bytes());
            String::from_utf8_lossy(&bytes).into_owned()
        }
    }
}

/// Splits `a=1&b=2` into decoded pairs. Keys without `=` get an empty value.
pub fn parse_query(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) => (decode(key), decode(value)),
            None => (decode(pair), String::new()),
        })
        .collect()
}

/// Joins pairs into an encoded query string, preserving order.
pub fn build_query<'a, I>(pairs: I) -> String
where
    I: IntoIterator<Item = (&'a str, Cow<'a, str>)>,
{
    pairs
        .into_iter()
        .map(|(key, value)| format!("{}={}", encode(key), encode(&value)))
        .collect::<Vec<_>>()
        .join("&")
}
