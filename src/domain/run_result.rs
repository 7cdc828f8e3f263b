use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// What survives of one match: the prompt sent and the model's answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchPrediction {
    pub prompt: String,
    /// Model response text
    #[serde(rename = "res")]
    pub response: String,
}

/// Predictions for one match-day, keyed by match id in processing order.
///
/// Serialises as a JSON object `{ "<match id>": { "prompt": .., "res": .. } }`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunResult {
    entries: Vec<(String, MatchPrediction)>,
}

impl RunResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a prediction; a repeated id replaces the earlier entry in place
    pub fn insert(&mut self, match_id: impl Into<String>, prediction: MatchPrediction) {
        let match_id = match_id.into();
        match self.entries.iter_mut().find(|(id, _)| *id == match_id) {
            Some((_, existing)) => *existing = prediction,
            None => self.entries.push((match_id, prediction)),
        }
    }

    pub fn get(&self, match_id: &str) -> Option<&MatchPrediction> {
        self.entries
            .iter()
            .find(|(id, _)| id == match_id)
            .map(|(_, p)| p)
    }

    pub fn match_ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(id, _)| id.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MatchPrediction)> {
        self.entries.iter().map(|(id, p)| (id.as_str(), p))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for RunResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (id, prediction) in self.iter() {
            map.serialize_entry(id, prediction)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for RunResult {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RunResultVisitor;

        impl<'de> Visitor<'de> for RunResultVisitor {
            type Value = RunResult;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of match id to prediction")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<RunResult, A::Error> {
                let mut result = RunResult::new();
                while let Some((id, prediction)) = access.next_entry::<String, MatchPrediction>()? {
                    result.insert(id, prediction);
                }
                Ok(result)
            }
        }

        deserializer.deserialize_map(RunResultVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prediction(n: u32) -> MatchPrediction {
        MatchPrediction {
            prompt: format!("Prompt {}", n),
            response: format!("Tipp {}:0", n),
        }
    }

    #[test]
    fn test_json_shape() {
        let mut result = RunResult::new();
        result.insert("111", prediction(1));

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "111": { "prompt": "Prompt 1", "res": "Tipp 1:0" } })
        );
    }

    #[test]
    fn test_preserves_insertion_order() {
        let mut result = RunResult::new();
        result.insert("333", prediction(3));
        result.insert("111", prediction(1));

        let json = serde_json::to_string(&result).unwrap();
        assert!(json.find("333").unwrap() < json.find("111").unwrap());

        let parsed: RunResult = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.match_ids().collect::<Vec<_>>(), vec!["333", "111"]);
        assert_eq!(parsed, result);
    }

    #[test]
    fn test_insert_replaces_existing() {
        let mut result = RunResult::new();
        result.insert("111", prediction(1));
        result.insert("111", prediction(2));
        assert_eq!(result.len(), 1);
        assert_eq!(result.get("111").unwrap().response, "Tipp 2:0");
    }
}
