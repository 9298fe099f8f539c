//! Country-name normalisation shared by every layer.
//!
//! Names arrive in several spellings (`united_states_of_america`, `China`,
//! `CHINA`). Display uses [`title_case`]; every comparison goes through
//! [`fold`].

/// Comparison key for a country name: lowercased, underscores read as spaces,
/// runs of whitespace collapsed, trimmed.
pub fn fold(name: &str) -> String {
  name
    .replace('_', " ")
    .split_whitespace()
    .map(str::to_lowercase)
    .collect::<Vec<_>>()
    .join(" ")
}

/// Capitalise each word: a letter is uppercased when the character before it
/// is not a letter, lowercased otherwise.
pub fn title_case(name: &str) -> String {
  let mut out = String::with_capacity(name.len());
  let mut prev_alpha = false;
  for c in fold(name).chars() {
    if c.is_alphabetic() {
      if prev_alpha {
        out.extend(c.to_lowercase());
      } else {
        out.extend(c.to_uppercase());
      }
      prev_alpha = true;
    } else {
      out.push(c);
      prev_alpha = false;
    }
  }
  out
}

/// Case-insensitive equality under [`fold`].
pub fn same_country(a: &str, b: &str) -> bool { fold(a) == fold(b) }
