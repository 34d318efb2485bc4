#![forbid(unsafe_code)]

pub mod model;
pub mod tree;

pub mod ids {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct WidgetId(i64);

    impl WidgetId {
        pub fn get(self) -> i64 {
            self.0
        }

        pub fn try_new(value: i64) -> Result<Self, IdError> {
            validate_row_id(value)?;
            Ok(Self(value))
        }
    }

    impl std::fmt::Display for WidgetId {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{}", self.0)
        }
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct GroupId(i64);

    impl GroupId {
        pub fn get(self) -> i64 {
            self.0
        }

        pub fn try_new(value: i64) -> Result<Self, IdError> {
            validate_row_id(value)?;
            Ok(Self(value))
        }
    }

    impl std::fmt::Display for GroupId {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{}", self.0)
        }
    }

    #[derive(Clone, Debug, PartialEq, Eq)]
    pub enum IdError {
        NotPositive(i64),
        Unparseable,
    }

    impl IdError {
        pub fn message(&self) -> &'static str {
            match self {
                Self::NotPositive(_) => "id must be a positive integer",
                Self::Unparseable => "id must be an integer",
            }
        }
    }

    /// Parses a decimal id as typed on a command line or read from a config file.
    pub fn parse_widget_id(value: &str) -> Result<WidgetId, IdError> {
        let raw = value.trim().parse::<i64>().map_err(|_| IdError::Unparseable)?;
        WidgetId::try_new(raw)
    }

    pub fn parse_group_id(value: &str) -> Result<GroupId, IdError> {
        let raw = value.trim().parse::<i64>().map_err(|_| IdError::Unparseable)?;
        GroupId::try_new(raw)
    }

    fn validate_row_id(value: i64) -> Result<(), IdError> {
        if value <= 0 {
            return Err(IdError::NotPositive(value));
        }
        Ok(())
    }
}
