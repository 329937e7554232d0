//! Database models for specializations.

/// Database request for creating a specialization. The code is stored upper-case.
#[derive(Debug, Clone)]
pub struct SpecializationCreateDBRequest {
    pub name: String,
    pub code: String,
    pub description: Option<String>,
}

impl SpecializationCreateDBRequest {
    pub fn new(name: impl Into<String>, code: &str, description: Option<String>) -> Self {
        Self {
            name: name.into(),
            code: code.trim().to_uppercase(),
            description,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_is_upper_cased() {
        let request = SpecializationCreateDBRequest::new("Prawo Podatkowe", " tax ", None);
        assert_eq!(request.code, "TAX");
    }
}
