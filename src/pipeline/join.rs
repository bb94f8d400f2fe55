use crate::domain::{CityRecord, PopupRecord};
use crate::pipeline::dedupe::ReferenceIndex;
use crate::pipeline::normalize::{normalize_city, CanonicalKey, CityAliases};

/// Left-outer join of pop-up records against the deduplicated reference.
///
/// Every input record appears exactly once in the output, in input order,
/// paired with its reference match or `None`. Unmatched records are kept;
/// nothing here decides whether that is a problem.
pub fn join_reference<'a>(
    popups: &'a [PopupRecord],
    index: &'a ReferenceIndex,
    aliases: &CityAliases,
) -> Vec<(&'a PopupRecord, Option<&'a CityRecord>)> {
    popups
        .iter()
        .map(|popup| {
            let city = normalize_city(popup.city.as_deref(), aliases);
            let matched = index.get(&CanonicalKey::from_name(&city));
            (popup, matched)
        })
        .collect()
}
