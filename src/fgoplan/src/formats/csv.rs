//! CSV export
//!
//! One line per servant:
//! `id,name,lvCur,lvTgt,ascCur,ascTgt,s1Cur,s1Tgt,s2Cur,s2Tgt,s3Cur,s3Tgt`.
//! Unset values are left empty and names are quoted when needed. Servants
//! missing from the catalog are skipped.

use crate::catalog::Catalog;
use crate::roster::{OwnedServant, Target};

/// Quote a field if it contains a separator, quote or newline.
fn escape(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

fn field(value: Option<u32>) -> String {
    value.map(|x| x.to_string()).unwrap_or_default()
}

fn target(target: &Target) -> String {
    format!("{},{}", field(target.current), field(target.target))
}

pub fn write(roster: &[OwnedServant], catalog: &Catalog) -> String {
    roster
        .iter()
        .filter_map(|servant| {
            let details = catalog.servant(servant.id)?;
            Some(format!(
                "{},{},{},{},{},{},{}",
                servant.id,
                escape(&details.name),
                target(&servant.level),
                target(&servant.ascension),
                target(&servant.skills[0]),
                target(&servant.skills[1]),
                target(&servant.skills[2]),
            ))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{self, FIVE_STAR, LOW_RARITY};
    use crate::id::ServantId;
    use crate::roster::new_servant;

    #[test]
    fn test_write_lines() {
        let catalog = fixtures::catalog();

        let mut first = new_servant(Some(FIVE_STAR));
        first.level = Target::between(1, 90);
        first.skills[0] = Target::new(Some(4), None);
        let second = new_servant(Some(LOW_RARITY));
        let missing = new_servant(Some(ServantId::tag(42)));

        let csv = write(&[first, second, missing], &catalog);
        assert_eq!(
            csv,
            "200100,Artoria Pendragon,1,90,,,4,,,,,\n100100,Test Servant,,,,,,,,,,"
        );
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("Mash Kyrielight"), "Mash Kyrielight");
        assert_eq!(escape("Jeanne d'Arc, Alter"), "\"Jeanne d'Arc, Alter\"");
        assert_eq!(escape("\"Nameless\""), "\"\"\"Nameless\"\"\"");
    }

    #[test]
    fn test_write_empty_roster() {
        assert_eq!(write(&[], &fixtures::catalog()), "");
    }
}
