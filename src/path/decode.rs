use std::borrow::Cow;
use std::collections::HashMap;

use crate::error::{PathError, PathResult};

/// Matrix variables of a single segment, e.g. `;color=red,blue;year=2012`
pub type MatrixVariables = HashMap<String, Vec<String>>;

/// Percent-decode `input`, rejecting malformed escapes and invalid UTF-8.
///
/// `offset` is the position of `input` within the full path and is only used
/// for error reporting.
pub(crate) fn decode(input: &str, offset: usize) -> PathResult<Cow<'_, str>> {
    let bytes = input.as_bytes();
    let first_escape = match bytes.iter().position(|b| *b == b'%') {
        None => return Ok(Cow::Borrowed(input)),
        Some(pos) => pos,
    };

    let mut i = first_escape;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let well_formed = bytes.len() > i + 2 && bytes[i + 1].is_ascii_hexdigit() && bytes[i + 2].is_ascii_hexdigit();
            if !well_formed {
                return Err(PathError::decode(input, offset + i, "Invalid percent-encoded sequence"));
            }
            i += 3;
        } else {
            i += 1;
        }
    }

    urlencoding::decode(input)
        .map_err(|_| PathError::decode(input, offset + first_escape, "Decoded bytes are not valid UTF-8"))
}

/// Parse the matrix variable part of a segment, starting at its first `;`.
///
/// Names without text are skipped; `name` alone binds an empty value and
/// `name=a,b` binds each comma separated value.
pub(crate) fn parse_matrix_variables(content: &str, offset: usize) -> PathResult<MatrixVariables> {
    let mut variables = MatrixVariables::new();
    let mut position = offset;

    for part in content.split(';') {
        let part_offset = position;
        position += part.len() + 1;
        if part.is_empty() {
            continue;
        }

        match part.split_once('=') {
            Some((raw_name, values)) => {
                let name = decode(raw_name, part_offset)?;
                if name.trim().is_empty() {
                    continue;
                }
                let values_offset = part_offset + raw_name.len() + 1;
                let decoded = values
                    .split(',')
                    .filter(|v| !v.is_empty())
                    .map(|v| decode(v, values_offset).map(Cow::into_owned))
                    .collect::<PathResult<Vec<String>>>()?;
                if !decoded.is_empty() {
                    variables.entry(name.into_owned()).or_default().extend(decoded);
                }
            }
            None => {
                let name = decode(part, part_offset)?;
                if !name.trim().is_empty() {
                    variables.entry(name.into_owned()).or_default().push(String::new());
                }
            }
        }
    }

    Ok(variables)
}
