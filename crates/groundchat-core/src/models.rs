/// Models offered for selection. Any other id is still accepted at request time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelOption {
    Flash25,
    Pro25,
    Flash3Preview,
    Pro3Preview,
}

pub const DEFAULT_MODEL_ID: &str = "gemini-2.5-flash";

impl ModelOption {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelOption::Flash25 => "gemini-2.5-flash",
            ModelOption::Pro25 => "gemini-2.5-pro",
            ModelOption::Flash3Preview => "gemini-3-flash-preview",
            ModelOption::Pro3Preview => "gemini-3-pro-preview",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "gemini-2.5-flash" => Some(ModelOption::Flash25),
            "gemini-2.5-pro" => Some(ModelOption::Pro25),
            "gemini-3-flash-preview" => Some(ModelOption::Flash3Preview),
            "gemini-3-pro-preview" => Some(ModelOption::Pro3Preview),
            _ => None,
        }
    }

    pub fn all() -> Vec<ModelOption> {
        vec![
            ModelOption::Flash25,
            ModelOption::Pro25,
            ModelOption::Flash3Preview,
            ModelOption::Pro3Preview,
        ]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ModelOption::Flash25 => "Gemini 2.5 Flash",
            ModelOption::Pro25 => "Gemini 2.5 Pro",
            ModelOption::Flash3Preview => "Gemini 3 Flash (preview)",
            ModelOption::Pro3Preview => "Gemini 3 Pro (preview)",
        }
    }
}

pub fn is_known_model(model_id: &str) -> bool {
    ModelOption::from_str(model_id).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_round_trip() {
        for option in ModelOption::all() {
            assert_eq!(ModelOption::from_str(option.as_str()), Some(option));
        }
    }

    #[test]
    fn test_default_is_offered() {
        assert!(is_known_model(DEFAULT_MODEL_ID));
        assert!(!is_known_model("gpt-4o"));
    }
}
