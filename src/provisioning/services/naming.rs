//! Romanization, username generation, and unique mailbox allocation.

use crate::identity::domain::{EmployeeNumber, Person};
use crate::identity::ports::EmailRegistry;
use crate::provisioning::ports::ProvisioningError;
use pinyin::ToPinyin;
use std::sync::Arc;
use tracing::debug;
use unicode_normalization::UnicodeNormalization;

/// Number of numbered variants tried before a local part is given up.
const MAX_EMAIL_CANDIDATES: u32 = 1_000;

/// A name broken into lowercase ASCII syllables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RomanizedName {
    syllables: Vec<String>,
}

impl RomanizedName {
    /// Romanizes `name`.
    ///
    /// Han characters become toneless pinyin syllables. Other text is
    /// decomposed and stripped to ASCII letters and digits, with each
    /// whitespace- or punctuation-separated word forming one syllable.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        let mut syllables = Vec::new();
        let mut word = String::new();
        for character in name.chars() {
            if let Some(pinyin) = character.to_pinyin() {
                flush(&mut word, &mut syllables);
                syllables.push(pinyin.plain().to_owned());
            } else if character.is_whitespace() || character.is_ascii_punctuation() {
                flush(&mut word, &mut syllables);
            } else {
                word.extend(
                    std::iter::once(character)
                        .nfkd()
                        .filter(char::is_ascii_alphanumeric)
                        .map(|c| c.to_ascii_lowercase()),
                );
            }
        }
        flush(&mut word, &mut syllables);
        Self { syllables }
    }

    /// Romanizes a person's name, falling back to the stored romanized name
    /// and then to the employee number.
    #[must_use]
    pub fn for_person(person: &Person) -> Self {
        let from_full_name = Self::from_name(person.full_name());
        if !from_full_name.is_empty() {
            return from_full_name;
        }
        if let Some(stored) = person.romanized_name().map(Self::from_name)
            && !stored.is_empty()
        {
            return stored;
        }
        Self::from_employee_number(person.employee_number())
    }

    fn from_employee_number(employee_number: &EmployeeNumber) -> Self {
        let fallback: String = employee_number
            .as_str()
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .map(|c| c.to_ascii_lowercase())
            .collect();
        Self {
            syllables: vec![fallback],
        }
    }

    /// Returns `true` when no syllable was produced.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.syllables.iter().all(String::is_empty)
    }

    /// Returns the syllables.
    #[must_use]
    pub fn syllables(&self) -> &[String] {
        &self.syllables
    }

    /// Returns the syllables joined without separators.
    #[must_use]
    pub fn joined(&self) -> String {
        self.syllables.concat()
    }

    /// Returns the first letter of every syllable.
    #[must_use]
    pub fn initials(&self) -> String {
        self.syllables
            .iter()
            .filter_map(|syllable| syllable.chars().next())
            .collect()
    }
}

fn flush(word: &mut String, syllables: &mut Vec<String>) {
    if !word.is_empty() {
        syllables.push(std::mem::take(word));
    }
}

/// Returns the username for a person: initials plus employee number.
#[must_use]
pub fn username(name: &RomanizedName, employee_number: &EmployeeNumber) -> String {
    format!("{}{}", name.initials(), employee_number)
}

/// Normalizes a configured domain to the bare host part.
#[must_use]
pub fn normalize_domain(domain: &str) -> String {
    domain.trim().trim_start_matches('@').to_ascii_lowercase()
}

/// Allocates mailbox addresses through the reservation registry.
#[derive(Clone)]
pub struct EmailAllocator {
    registry: Arc<dyn EmailRegistry>,
}

impl std::fmt::Debug for EmailAllocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailAllocator").finish_non_exhaustive()
    }
}

impl EmailAllocator {
    /// Creates an allocator over `registry`.
    #[must_use]
    pub fn new(registry: Arc<dyn EmailRegistry>) -> Self {
        Self { registry }
    }

    /// Returns the person's mailbox address, reserving one if needed.
    ///
    /// A person's first reserved address is reused. Otherwise `local@domain`,
    /// `local2@domain`, `local3@domain`, ... are tried until one is
    /// reserved for or already owned by the person.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError::Identity`] when the registry fails and
    /// [`ProvisioningError::EmailExhausted`] when every candidate is taken.
    pub async fn allocate(
        &self,
        employee_number: &EmployeeNumber,
        name: &RomanizedName,
        domain: &str,
    ) -> Result<String, ProvisioningError> {
        if let Some(existing) = self.registry.address_for(employee_number).await? {
            return Ok(existing);
        }

        let local_part = name.joined();
        let host = normalize_domain(domain);
        for suffix in 1..=MAX_EMAIL_CANDIDATES {
            let candidate = if suffix == 1 {
                format!("{local_part}@{host}")
            } else {
                format!("{local_part}{suffix}@{host}")
            };
            let outcome = self.registry.try_reserve(&candidate, employee_number).await?;
            if outcome.is_owned() {
                debug!(%employee_number, address = %candidate, "mailbox address reserved");
                return Ok(candidate);
            }
        }
        Err(ProvisioningError::EmailExhausted {
            local_part,
            domain: host,
        })
    }
}
