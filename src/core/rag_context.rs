use crate::core::directory::DoctorDirectory;
use crate::domain::ports::ScheduleStore;
use crate::utils::error::Result;

pub const DEFAULT_MAX_ITEMS: usize = 10;
pub const DEFAULT_MAX_CHARS: usize = 2000;

const LISTING_HEADER: &str = "Doctors in the directory:\n\n";
const NOT_FOUND_PREFIX: &str = "No doctors found";
const ELLIPSIS: &str = "...";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextFilter {
    pub name: Option<String>,
    pub specialty: Option<String>,
}

impl ContextFilter {
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            specialty: None,
        }
    }

    pub fn by_specialty(specialty: impl Into<String>) -> Self {
        Self {
            name: None,
            specialty: Some(specialty.into()),
        }
    }
}

/// Renders a bounded, roster-ordered listing of doctors for prompt grounding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RagContextBuilder {
    pub max_items: usize,
    pub max_chars: usize,
}

impl Default for RagContextBuilder {
    fn default() -> Self {
        Self {
            max_items: DEFAULT_MAX_ITEMS,
            max_chars: DEFAULT_MAX_CHARS,
        }
    }
}

impl RagContextBuilder {
    pub fn new(max_items: usize, max_chars: usize) -> Self {
        Self {
            max_items,
            max_chars,
        }
    }

    /// Loads the roster from `store` and renders it. An unreachable roster is an error.
    pub async fn build<S: ScheduleStore>(&self, store: &S, filter: &ContextFilter) -> Result<String> {
        let directory = DoctorDirectory::load(store).await?;
        Ok(self.render(&directory, filter))
    }

    /// The name filter wins when both are set.
    pub fn render(&self, directory: &DoctorDirectory, filter: &ContextFilter) -> String {
        let name = non_blank(filter.name.as_deref());
        let specialty = non_blank(filter.specialty.as_deref());

        let doctors = match (name, specialty) {
            (Some(name), _) => directory.find_by_name(name),
            (None, Some(specialty)) => directory.find_by_specialty(specialty),
            (None, None) => directory.all().to_vec(),
        };

        if doctors.is_empty() {
            return not_found_message(name, specialty);
        }

        let mut context = String::from(LISTING_HEADER);
        for doctor in doctors.iter().take(self.max_items) {
            context.push_str(&format!("- {}, {}\n", doctor.name, doctor.specialty));
        }
        if doctors.len() > self.max_items {
            context.push_str(&format!("({} more not shown)\n", doctors.len() - self.max_items));
        }

        truncate_chars(context, self.max_chars)
    }
}

/// True when `context` is the sentinel produced for an empty result.
pub fn is_not_found(context: &str) -> bool {
    context.starts_with(NOT_FOUND_PREFIX)
}

fn not_found_message(name: Option<&str>, specialty: Option<&str>) -> String {
    format!(
        "{} (filter: name='{}', specialty='{}')",
        NOT_FOUND_PREFIX,
        name.unwrap_or_default(),
        specialty.unwrap_or_default()
    )
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn truncate_chars(text: String, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text;
    }
    let keep = max_chars.saturating_sub(ELLIPSIS.len());
    let mut truncated: String = text.chars().take(keep).collect();
    truncated.push_str(ELLIPSIS);
    truncated
}
