//! Placeholder kinds and the compiled substitution map.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// A placeholder recognized in the pattern source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Placeholder {
    /// `<+ddd>`: the sequence value, zero-padded to `width` digits
    Counter { width: usize },

    /// `<?name(1,2)>`: a custom replacer fed by capture groups `arg_indices`
    Function { name: String, arg_indices: Vec<usize> },

    /// `<user.firstName>`: a dotted-path lookup into the caller's data
    DataPath { path: String },
}

impl Placeholder {
    /// Short kind label used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Counter { .. } => "counter",
            Self::Function { .. } => "function",
            Self::DataPath { .. } => "data",
        }
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Counter { width } => write!(f, "counter(width={width})"),
            Self::Function { name, arg_indices } if arg_indices.is_empty() => {
                write!(f, "function({name})")
            }
            Self::Function { name, arg_indices } => {
                let args: Vec<String> = arg_indices.iter().map(ToString::to_string).collect();
                write!(f, "function({name}, groups=[{}])", args.join(","))
            }
            Self::DataPath { path } => write!(f, "data({path})"),
        }
    }
}

/// Index → placeholder record, built once per compiled pattern.
///
/// Indices are assigned in source order starting at 0 and match the neutral
/// `<N>` tokens embedded in the plain pattern.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SubstitutionMap {
    entries: BTreeMap<usize, Placeholder>,
}

impl SubstitutionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a placeholder and return its index.
    pub fn push(&mut self, placeholder: Placeholder) -> usize {
        let index = self.entries.len();
        self.entries.insert(index, placeholder);
        index
    }

    pub fn get(&self, index: usize) -> Option<&Placeholder> {
        self.entries.get(&index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Placeholder)> {
        self.entries.iter().map(|(index, p)| (*index, p))
    }

    /// Whether any counter placeholder is present.
    pub fn has_counter(&self) -> bool {
        self.entries
            .values()
            .any(|p| matches!(p, Placeholder::Counter { .. }))
    }

    /// Function placeholders as `(index, name, arg_indices)`.
    pub fn functions(&self) -> impl Iterator<Item = (usize, &str, &[usize])> {
        self.entries.iter().filter_map(|(index, p)| match p {
            Placeholder::Function { name, arg_indices } => {
                Some((*index, name.as_str(), arg_indices.as_slice()))
            }
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_assigns_sequential_indices() {
        let mut map = SubstitutionMap::new();
        assert_eq!(map.push(Placeholder::Counter { width: 3 }), 0);
        assert_eq!(
            map.push(Placeholder::DataPath {
                path: "user.name".to_string()
            }),
            1
        );
        assert_eq!(map.len(), 2);
        assert!(map.has_counter());
        assert_eq!(map.get(1).map(Placeholder::kind), Some("data"));
    }

    #[test]
    fn test_functions_filter() {
        let mut map = SubstitutionMap::new();
        map.push(Placeholder::Counter { width: 0 });
        map.push(Placeholder::Function {
            name: "checksum".to_string(),
            arg_indices: vec![1, 2],
        });

        let functions: Vec<_> = map.functions().collect();
        assert_eq!(functions, vec![(1, "checksum", &[1usize, 2][..])]);
    }

    #[test]
    fn test_display() {
        let p = Placeholder::Function {
            name: "f".to_string(),
            arg_indices: vec![1, 3],
        };
        assert_eq!(p.to_string(), "function(f, groups=[1,3])");
        assert_eq!(
            Placeholder::Counter { width: 4 }.to_string(),
            "counter(width=4)"
        );
    }

    #[test]
    fn test_serialize_map() {
        let mut map = SubstitutionMap::new();
        map.push(Placeholder::Counter { width: 2 });
        let json = serde_json::to_value(&map).unwrap();
        assert_eq!(json["0"]["type"], "counter");
        assert_eq!(json["0"]["width"], 2);
    }
}
