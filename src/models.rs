use rustc_hash::FxHashMap;
use serde::de::{self, DeserializeSeed, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::Deserialize;
use std::fmt;
use std::marker::PhantomData;

/// One newline-delimited unit of the decompressed dump, terminator removed.
pub type RawLine = Vec<u8>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntityKind {
    Item,
    Property,
    /// Lexemes, forms, senses, and records whose `type` is missing or not a string
    #[default]
    Other,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Item => "item",
            EntityKind::Property => "property",
            EntityKind::Other => "other",
        }
    }
}

impl<'de> Deserialize<'de> for EntityKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = PathSeed(&[]).deserialize(deserializer)?;
        Ok(match tag.as_deref() {
            Some("item") => EntityKind::Item,
            Some("property") => EntityKind::Property,
            _ => EntityKind::Other,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalizedText {
    pub value: String,
}

/// `{"language": .., "value": ..}`, or nothing if the entry has another shape.
struct Text(Option<String>);

impl<'de> Deserialize<'de> for Text {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        PathSeed(&["value"]).deserialize(deserializer).map(Text)
    }
}

/// A claim on an entity. Only the target entity id is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Statement {
    target: Option<String>,
}

impl Statement {
    pub fn with_target(id: &str) -> Self {
        Self {
            target: Some(id.to_string()),
        }
    }

    /// Id of the entity this claim points at, if its value is an entity reference.
    pub fn target_id(&self) -> Option<&str> {
        self.target.as_deref()
    }
}

impl<'de> Deserialize<'de> for Statement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        PathSeed(&["mainsnak", "datavalue", "value", "id"])
            .deserialize(deserializer)
            .map(|target| Statement { target })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EntityRecord {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: EntityKind,
    #[serde(default, deserialize_with = "texts")]
    pub labels: FxHashMap<String, LocalizedText>,
    #[serde(default, deserialize_with = "texts")]
    pub descriptions: FxHashMap<String, LocalizedText>,
    #[serde(default, deserialize_with = "text_lists")]
    pub aliases: FxHashMap<String, Vec<LocalizedText>>,
    #[serde(default, deserialize_with = "statements")]
    pub claims: FxHashMap<String, Vec<Statement>>,
}

impl EntityRecord {
    pub fn label(&self, lang: &str) -> Option<&str> {
        self.labels.get(lang).map(|t| t.value.as_str())
    }

    pub fn description(&self, lang: &str) -> Option<&str> {
        self.descriptions.get(lang).map(|t| t.value.as_str())
    }

    pub fn aliases(&self, lang: &str) -> impl Iterator<Item = &str> {
        self.aliases
            .get(lang)
            .into_iter()
            .flatten()
            .map(|t| t.value.as_str())
    }

    /// Target entity ids of every claim under `relation`.
    pub fn claim_targets<'a>(&'a self, relation: &str) -> impl Iterator<Item = &'a str> + 'a {
        self.claims
            .get(relation)
            .into_iter()
            .flatten()
            .filter_map(Statement::target_id)
    }
}

fn texts<'de, D>(deserializer: D) -> Result<FxHashMap<String, LocalizedText>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_map::<_, Text>(deserializer)?
        .into_iter()
        .filter_map(|(lang, text)| text.0.map(|value| (lang, LocalizedText { value })))
        .collect())
}

fn text_lists<'de, D>(deserializer: D) -> Result<FxHashMap<String, Vec<LocalizedText>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_map::<_, List<Text>>(deserializer)?
        .into_iter()
        .map(|(lang, list)| {
            let values = list
                .0
                .into_iter()
                .filter_map(|text| text.0.map(|value| LocalizedText { value }))
                .collect();
            (lang, values)
        })
        .collect())
}

fn statements<'de, D>(deserializer: D) -> Result<FxHashMap<String, Vec<Statement>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_map::<_, List<Statement>>(deserializer)?
        .into_iter()
        .map(|(relation, list)| (relation, list.0))
        .collect())
}

/// Every JSON scalar except a string means "no value".
macro_rules! no_value_for_scalars {
    ($empty:expr) => {
        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok($empty)
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok($empty)
        }

        fn visit_bool<E: de::Error>(self, _: bool) -> Result<Self::Value, E> {
            Ok($empty)
        }

        fn visit_i64<E: de::Error>(self, _: i64) -> Result<Self::Value, E> {
            Ok($empty)
        }

        fn visit_u64<E: de::Error>(self, _: u64) -> Result<Self::Value, E> {
            Ok($empty)
        }

        fn visit_f64<E: de::Error>(self, _: f64) -> Result<Self::Value, E> {
            Ok($empty)
        }
    };
}

/// Follows object keys down to a string leaf without materializing anything
/// else. Any other shape along the way yields `None`.
#[derive(Clone, Copy)]
struct PathSeed(&'static [&'static str]);

impl<'de> DeserializeSeed<'de> for PathSeed {
    type Value = Option<String>;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_any(self)
    }
}

impl<'de> Visitor<'de> for PathSeed {
    type Value = Option<String>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "any value, read at path {:?}", self.0)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(self.0.is_empty().then(|| v.to_string()))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut found = None;
        while let Some(key) = map.next_key::<String>()? {
            match self.0.split_first() {
                Some((head, rest)) if key == *head => {
                    if let Some(v) = map.next_value_seed(PathSeed(rest))? {
                        found = Some(v);
                    }
                }
                _ => {
                    map.next_value::<IgnoredAny>()?;
                }
            }
        }
        Ok(found)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(None)
    }

    no_value_for_scalars!(None);
}

/// A JSON array of tolerant elements; anything else is an empty list.
struct List<T>(Vec<T>);

impl<'de, T: Deserialize<'de>> Deserialize<'de> for List<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ListVisitor<T>(PhantomData<T>);

        impl<'de, T: Deserialize<'de>> Visitor<'de> for ListVisitor<T> {
            type Value = List<T>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a list")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let mut out = Vec::new();
                while let Some(item) = seq.next_element::<T>()? {
                    out.push(item);
                }
                Ok(List(out))
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
                Ok(List(Vec::new()))
            }

            fn visit_str<E: de::Error>(self, _: &str) -> Result<Self::Value, E> {
                Ok(List(Vec::new()))
            }

            no_value_for_scalars!(List(Vec::new()));
        }

        deserializer.deserialize_any(ListVisitor(PhantomData))
    }
}

/// Dumps write empty maps as `[]`, and some records carry `null`. Both mean
/// "no value", as does any other non-object. Values must be tolerant types
/// so one bad entry never fails the record.
fn lenient_map<'de, D, V>(deserializer: D) -> Result<FxHashMap<String, V>, D::Error>
where
    D: Deserializer<'de>,
    V: Deserialize<'de>,
{
    struct LenientMap<V>(PhantomData<V>);

    impl<'de, V: Deserialize<'de>> Visitor<'de> for LenientMap<V> {
        type Value = FxHashMap<String, V>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a map keyed by language or relation")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            let mut out = FxHashMap::default();
            while let Some((k, v)) = map.next_entry::<String, V>()? {
                out.insert(k, v);
            }
            Ok(out)
        }

        fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            while seq.next_element::<IgnoredAny>()?.is_some() {}
            Ok(FxHashMap::default())
        }

        fn visit_str<E: de::Error>(self, _: &str) -> Result<Self::Value, E> {
            Ok(FxHashMap::default())
        }

        no_value_for_scalars!(FxHashMap::default());
    }

    deserializer.deserialize_any(LenientMap(PhantomData))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> EntityRecord {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn kind_from_type_tag() {
        assert_eq!(parse(r#"{"id":"Q1","type":"item"}"#).kind, EntityKind::Item);
        assert_eq!(
            parse(r#"{"id":"P31","type":"property"}"#).kind,
            EntityKind::Property
        );
        assert_eq!(
            parse(r#"{"id":"L1","type":"lexeme"}"#).kind,
            EntityKind::Other
        );
    }

    #[test]
    fn missing_type_is_other() {
        assert_eq!(parse(r#"{"id":"Q1"}"#).kind, EntityKind::Other);
    }

    #[test]
    fn missing_id_is_an_error() {
        assert!(serde_json::from_str::<EntityRecord>(r#"{"type":"item"}"#).is_err());
    }

    #[test]
    fn empty_array_maps_are_empty() {
        let rec = parse(r#"{"id":"Q1","type":"item","labels":[],"aliases":[],"claims":[]}"#);
        assert!(rec.labels.is_empty());
        assert!(rec.aliases.is_empty());
        assert!(rec.claims.is_empty());
    }

    #[test]
    fn null_maps_are_empty() {
        let rec = parse(r#"{"id":"Q1","type":"item","labels":null,"descriptions":null}"#);
        assert_eq!(rec.label("en"), None);
        assert_eq!(rec.description("en"), None);
    }

    #[test]
    fn localized_lookups() {
        let rec = parse(
            r#"{"id":"Q1","type":"item",
                "labels":{"en":{"language":"en","value":"Universe"}},
                "descriptions":{"de":{"language":"de","value":"Weltall"}},
                "aliases":{"en":[{"language":"en","value":"cosmos"},{"language":"en","value":"all"}]}}"#,
        );
        assert_eq!(rec.label("en"), Some("Universe"));
        assert_eq!(rec.label("fr"), None);
        assert_eq!(rec.description("de"), Some("Weltall"));
        assert_eq!(rec.aliases("en").collect::<Vec<_>>(), vec!["cosmos", "all"]);
        assert_eq!(rec.aliases("de").count(), 0);
    }

    #[test]
    fn claim_targets_skip_non_entity_values() {
        let rec = parse(
            r#"{"id":"Q42","type":"item","claims":{
                "P31":[{"mainsnak":{"snaktype":"value","property":"P31",
                    "datavalue":{"value":{"entity-type":"item","numeric-id":5,"id":"Q5"},
                                 "type":"wikibase-entityid"}}}],
                "P1477":[{"mainsnak":{"snaktype":"value",
                    "datavalue":{"value":"Douglas Adams","type":"string"}}}],
                "P569":[{"mainsnak":{"snaktype":"somevalue"}}]
            }}"#,
        );
        assert_eq!(rec.claim_targets("P31").collect::<Vec<_>>(), vec!["Q5"]);
        assert_eq!(rec.claim_targets("P1477").count(), 0);
        assert_eq!(rec.claim_targets("P569").count(), 0);
        assert_eq!(rec.claim_targets("P279").count(), 0);
    }

    #[test]
    fn kind_tags() {
        assert_eq!(EntityKind::Item.as_str(), "item");
        assert_eq!(EntityKind::Property.as_str(), "property");
    }

    #[test]
    fn non_string_type_is_other() {
        assert_eq!(parse(r#"{"id":"Q1","type":null}"#).kind, EntityKind::Other);
        assert_eq!(parse(r#"{"id":"Q1","type":7}"#).kind, EntityKind::Other);
        assert_eq!(
            parse(r#"{"id":"Q1","type":{"name":"item"}}"#).kind,
            EntityKind::Other
        );
        assert_eq!(parse(r#"{"id":"Q1","type":["item"]}"#).kind, EntityKind::Other);
    }

    #[test]
    fn bad_language_entry_is_absent() {
        let rec = parse(
            r#"{"id":"Q1","type":"item",
                "labels":{"en":null,"de":{"value":"x"},"fr":{"value":3},"it":"y"},
                "descriptions":{"en":[1,2],"de":{"language":"de"}}}"#,
        );
        assert_eq!(rec.label("en"), None);
        assert_eq!(rec.label("de"), Some("x"));
        assert_eq!(rec.label("fr"), None);
        assert_eq!(rec.label("it"), None);
        assert_eq!(rec.description("en"), None);
        assert_eq!(rec.description("de"), None);
    }

    #[test]
    fn bad_alias_entries_are_dropped() {
        let rec = parse(
            r#"{"id":"Q1","type":"item","aliases":{
                "en":[{"value":"a"},null,{"value":{"nested":true}},{"value":"b"}],
                "de":{"value":"not a list"}}}"#,
        );
        assert_eq!(rec.aliases("en").collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(rec.aliases("de").count(), 0);
    }

    #[test]
    fn odd_claim_shapes_do_not_fail_the_record() {
        let rec = parse(
            r#"{"id":"Q1","type":"item","claims":{
                "P31":"oops",
                "P279":[5,{"mainsnak":"x"},{"mainsnak":{"datavalue":{"value":{"id":7}}}},
                        {"mainsnak":{"datavalue":{"value":{"id":"Q9"}}}}],
                "P17":null}}"#,
        );
        assert_eq!(rec.claim_targets("P31").count(), 0);
        assert_eq!(rec.claim_targets("P279").collect::<Vec<_>>(), vec!["Q9"]);
        assert_eq!(rec.claim_targets("P17").count(), 0);
    }
}
