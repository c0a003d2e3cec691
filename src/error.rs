use thiserror::Error;

/// A single profile field that could not be lifted out of the page.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("{field}: no element matching `{selector}`")]
    MissingElement {
        field: &'static str,
        selector: &'static str,
    },

    #[error("{field}: {value:?} is not an integer")]
    NotAnInteger { field: &'static str, value: String },
}

impl FieldError {
    pub fn field(&self) -> &'static str {
        match self {
            Self::MissingElement { field, .. } | Self::NotAnInteger { field, .. } => field,
        }
    }
}

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("invalid profile URL: {0}")]
    Url(String),

    #[error("invalid CSS selector `{0}`")]
    Selector(&'static str),

    #[error("scrape failed: unexpected page structure ({})", join_fields(.0))]
    UnexpectedStructure(Vec<FieldError>),
}

fn join_fields(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structure_error_lists_every_field() {
        let err = ScrapeError::UnexpectedStructure(vec![
            FieldError::MissingElement {
                field: "rank",
                selector: ".leagueTier",
            },
            FieldError::NotAnInteger {
                field: "level",
                value: "abc".into(),
            },
        ]);

        assert_eq!(
            err.to_string(),
            "scrape failed: unexpected page structure \
             (rank: no element matching `.leagueTier`; level: \"abc\" is not an integer)"
        );
    }
}
