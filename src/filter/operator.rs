use super::error::FilterError;
use std::fmt;
use std::str::FromStr;

/// Comparison operators accepted in the `op` field of a filter leaf
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    StartsWith,
    EndsWith,
    /// Accessed value is contained in the filter value
    Like,
    /// Case-insensitive `Like`
    ILike,
    NotLike,
    NotILike,
    In,
    NotIn,
}

impl FromStr for Operator {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "eq" => Ok(Operator::Eq),
            "ne" => Ok(Operator::Ne),
            "gt" => Ok(Operator::Gt),
            "ge" => Ok(Operator::Ge),
            "lt" => Ok(Operator::Lt),
            "le" => Ok(Operator::Le),
            "startswith" => Ok(Operator::StartsWith),
            "endswith" => Ok(Operator::EndsWith),
            "like" => Ok(Operator::Like),
            "ilike" => Ok(Operator::ILike),
            "notlike" => Ok(Operator::NotLike),
            "notilike" => Ok(Operator::NotILike),
            "in_" => Ok(Operator::In),
            "notin_" => Ok(Operator::NotIn),
            _ => Err(FilterError::UnknownOperator(s.to_string())),
        }
    }
}

impl Operator {
    pub const ALL: [Operator; 14] = [
        Operator::Eq,
        Operator::Ne,
        Operator::Gt,
        Operator::Ge,
        Operator::Lt,
        Operator::Le,
        Operator::StartsWith,
        Operator::EndsWith,
        Operator::Like,
        Operator::ILike,
        Operator::NotLike,
        Operator::NotILike,
        Operator::In,
        Operator::NotIn,
    ];

    /// Get the wire name of this operator
    pub fn canonical_name(&self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::Ne => "ne",
            Operator::Gt => "gt",
            Operator::Ge => "ge",
            Operator::Lt => "lt",
            Operator::Le => "le",
            Operator::StartsWith => "startswith",
            Operator::EndsWith => "endswith",
            Operator::Like => "like",
            Operator::ILike => "ilike",
            Operator::NotLike => "notlike",
            Operator::NotILike => "notilike",
            Operator::In => "in_",
            Operator::NotIn => "notin_",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_canonical_name_parses_back() {
        for op in Operator::ALL {
            assert_eq!(op.canonical_name().parse::<Operator>().unwrap(), op);
        }
    }

    #[test]
    fn test_unknown_operator() {
        let err = "between".parse::<Operator>().unwrap_err();
        assert_eq!(err, FilterError::UnknownOperator("between".to_string()));
    }

    #[test]
    fn test_operator_names_are_case_sensitive() {
        assert!("EQ".parse::<Operator>().is_err());
        assert!("in".parse::<Operator>().is_err());
    }
}
