//! Location keys and the aggregated location table.

use std::collections::BTreeMap;
use std::fmt;

use super::WORLDWIDE;

/// Daily cumulative counts, one per header date.
pub type Series = Vec<i64>;

/// Identifies one entry of a [`LocationTable`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LocationKey {
    /// Date labels shared by every series.
    Header,
    /// The country-level row of a country, listed without a region.
    Country(String),
    /// One reporting region of a country, exactly as listed in the source.
    Subregion { country: String, name: String },
    /// Day-wise sum over every region of a country.
    CountryTotal(String),
    /// Day-wise sum over every row of the source.
    WorldwideTotal,
}

impl LocationKey {
    /// Resolves a location name chosen by the operator.
    ///
    /// `"Worldwide"` selects the worldwide total, any other name a country total.
    pub fn from_choice(name: &str) -> Self {
        if name == WORLDWIDE {
            LocationKey::WorldwideTotal
        } else {
            LocationKey::CountryTotal(name.to_string())
        }
    }
}

impl fmt::Display for LocationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationKey::Header => f.write_str("Header"),
            LocationKey::Country(country) => write!(f, "{country} (country row)"),
            LocationKey::Subregion { country, name } => write!(f, "{country} / {name}"),
            LocationKey::CountryTotal(country) => f.write_str(country),
            LocationKey::WorldwideTotal => f.write_str(WORLDWIDE),
        }
    }
}

/// A resolved table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entry<'a> {
    Header(&'a [String]),
    Series(&'a [i64]),
}

/// Mapping from locations to series for one downloaded file.
///
/// Invariant: every series has exactly `header().len()` points.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationTable {
    pub(crate) header: Vec<String>,
    pub(crate) subregions: BTreeMap<(String, String), Series>,
    pub(crate) totals: BTreeMap<String, Series>,
    pub(crate) worldwide: Series,
}

impl LocationTable {
    /// Date labels, one per day column.
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Number of days covered.
    pub fn days(&self) -> usize {
        self.header.len()
    }

    pub fn lookup(&self, key: &LocationKey) -> Option<Entry<'_>> {
        match key {
            LocationKey::Header => Some(Entry::Header(&self.header)),
            _ => self.series(key).map(Entry::Series),
        }
    }

    /// Returns the series stored under `key`; `None` for [`LocationKey::Header`].
    pub fn series(&self, key: &LocationKey) -> Option<&[i64]> {
        match key {
            LocationKey::Header => None,
            LocationKey::Country(country) => self.country_row(country),
            LocationKey::Subregion { country, name } => self.subregion(country, name),
            LocationKey::CountryTotal(country) => self.country_total(country),
            LocationKey::WorldwideTotal => Some(self.worldwide_total()),
        }
    }

    pub fn subregion(&self, country: &str, name: &str) -> Option<&[i64]> {
        self.subregions
            .get(&(country.to_string(), name.to_string()))
            .map(Vec::as_slice)
    }

    /// The row of `country` whose region cell is blank, if the source has one.
    pub fn country_row(&self, country: &str) -> Option<&[i64]> {
        self.subregions_of(country)
            .find(|(name, _)| name.trim().is_empty())
            .map(|(_, series)| series)
    }

    pub fn country_total(&self, country: &str) -> Option<&[i64]> {
        self.totals.get(country).map(Vec::as_slice)
    }

    pub fn worldwide_total(&self) -> &[i64] {
        &self.worldwide
    }

    /// Countries in sorted order.
    pub fn countries(&self) -> impl Iterator<Item = &str> {
        self.totals.keys().map(String::as_str)
    }

    /// Regions of `country` with their series, sorted by region name.
    pub fn subregions_of<'a, 'b>(
        &'a self,
        country: &'b str,
    ) -> impl Iterator<Item = (&'a str, &'a [i64])> + use<'a, 'b> {
        self.subregions
            .iter()
            .filter(move |((c, _), _)| c == country)
            .map(|((_, name), series)| (name.as_str(), series.as_slice()))
    }

    /// Names the operator can choose from: `"Worldwide"` followed by every country.
    pub fn location_names(&self) -> Vec<&str> {
        std::iter::once(super::WORLDWIDE)
            .chain(self.countries())
            .collect()
    }

    /// Every key present in the table, header included.
    pub fn keys(&self) -> Vec<LocationKey> {
        let mut keys = vec![LocationKey::Header, LocationKey::WorldwideTotal];
        keys.extend(self.totals.keys().cloned().map(LocationKey::CountryTotal));
        keys.extend(self.subregions.keys().map(|(country, name)| {
            if name.trim().is_empty() {
                LocationKey::Country(country.clone())
            } else {
                LocationKey::Subregion {
                    country: country.clone(),
                    name: name.clone(),
                }
            }
        }));
        keys
    }
}
