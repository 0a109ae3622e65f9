//! Third-party material simulator format
//!
//! A JSON array of 11-tuples:
//! `[simulatorId, ascCur, ascTgt, s1Cur, s1Tgt, s2Cur, s2Tgt, s3Cur, s3Tgt, _, _]`.
//! Servants are identified by the simulator's own numbering, see
//! [`Catalog::servant_by_webcrow_id`].

use super::FormatError;
use crate::ascension::{ascension_target, MAX_ASCENSION};
use crate::catalog::Catalog;
use crate::roster::{new_servant, OwnedServant, Target};
use serde_json::Value;

const TUPLE_LEN: usize = 11;
const MAX_SKILL_LEVEL: u32 = 10;

const FIELDS: [&str; TUPLE_LEN] = [
    "servant id",
    "current ascension",
    "target ascension",
    "current skill #1",
    "target skill #1",
    "current skill #2",
    "target skill #2",
    "current skill #3",
    "target skill #3",
    "unknown field #1",
    "unknown field #2",
];

fn invalid(index: usize, field: &'static str, problem: impl Into<String>) -> FormatError {
    FormatError::InvalidField {
        index,
        field,
        problem: problem.into(),
    }
}

/// Validate one tuple, returning the nine meaningful fields.
fn parse_tuple(index: usize, entry: &Value) -> Result<[u32; 9], FormatError> {
    let values = entry
        .as_array()
        .ok_or_else(|| FormatError::Layout(format!("entry {} is not an array", index)))?;
    if values.len() != TUPLE_LEN {
        return Err(FormatError::Layout(format!(
            "entry {} has {} fields, expected {}",
            index,
            values.len(),
            TUPLE_LEN
        )));
    }

    for (field, value) in FIELDS.iter().copied().zip(values).skip(9) {
        if !value.is_number() {
            return Err(invalid(index, field, "must be a number"));
        }
    }

    let mut fields = [0u32; 9];
    for (i, (field, value)) in FIELDS.iter().copied().zip(values).take(9).enumerate() {
        let number = value
            .as_u64()
            .and_then(|x| u32::try_from(x).ok())
            .ok_or_else(|| invalid(index, field, "must be a non-negative integer"))?;

        let (min, max) = match i {
            0 => (1, u32::MAX),
            1 | 2 => (0, MAX_ASCENSION),
            _ => (0, MAX_SKILL_LEVEL),
        };
        if number < min || number > max {
            return Err(invalid(
                index,
                field,
                format!("must be between {} and {}, got {}", min, max, number),
            ));
        }
        fields[i] = number;
    }

    Ok(fields)
}

/// Decode a simulator payload into a fresh roster.
///
/// The whole payload is rejected on the first invalid entry. Entries naming
/// servants the catalog doesn't know are skipped.
pub fn read(contents: &str, catalog: &Catalog) -> Result<Vec<OwnedServant>, FormatError> {
    let json: Value = serde_json::from_str(contents)?;
    let entries = json
        .as_array()
        .ok_or_else(|| FormatError::Layout("expected an array of servants".into()))?;

    let parsed = entries
        .iter()
        .enumerate()
        .map(|(index, entry)| parse_tuple(index, entry))
        .collect::<Result<Vec<_>, _>>()?;

    let mut roster = Vec::new();
    for [id, asc_cur, asc_tgt, s1_cur, s1_tgt, s2_cur, s2_tgt, s3_cur, s3_tgt] in parsed {
        let Some(details) = catalog.servant_by_webcrow_id(id) else {
            continue;
        };

        let mut servant = new_servant(Some(details.id));
        servant.ascension = Target::between(asc_cur, asc_tgt);
        servant.skills = [
            Target::between(s1_cur, s1_tgt),
            Target::between(s2_cur, s2_tgt),
            Target::between(s3_cur, s3_tgt),
        ];
        roster.push(servant);
    }

    Ok(roster)
}

/// Encode a roster for the simulator, filling unset values with their
/// natural start and end points.
pub fn write(roster: &[OwnedServant], catalog: &Catalog) -> Result<String, FormatError> {
    let skill = |target: &Target| {
        [
            target.current.unwrap_or(1),
            target.target.unwrap_or(MAX_SKILL_LEVEL),
        ]
    };

    let tuples: Vec<[u32; TUPLE_LEN]> = roster
        .iter()
        .filter_map(|servant| {
            let details = catalog.servant(servant.id)?;
            let ascension = ascension_target(details, servant);
            let [s1_cur, s1_tgt] = skill(&servant.skills[0]);
            let [s2_cur, s2_tgt] = skill(&servant.skills[1]);
            let [s3_cur, s3_tgt] = skill(&servant.skills[2]);

            Some([
                details.webcrow_id,
                ascension.current.unwrap_or(0),
                ascension.target.unwrap_or(MAX_ASCENSION),
                s1_cur,
                s1_tgt,
                s2_cur,
                s2_tgt,
                s3_cur,
                s3_tgt,
                1,
                0,
            ])
        })
        .collect();

    Ok(serde_json::to_string(&tuples)?)
}
