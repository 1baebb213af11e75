//! numbering.xml parsing: list kinds and start values per numbering id.

use std::collections::HashMap;

use quick_xml::events::Event;

use super::styles::get_val;
use crate::error::{Error, Result};

/// Whether a numbering level renders bullets or numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListKind {
    Bullet,
    Ordered,
}

/// A numbering level definition.
#[derive(Debug, Clone)]
pub struct NumLevel {
    /// Level index (0-8)
    pub level: u8,
    pub start: u32,
    /// Number format (decimal, bullet, lowerLetter, etc.)
    pub num_fmt: String,
    /// Level text (e.g., "%1.", "%1.%2.")
    pub level_text: String,
}

impl NumLevel {
    pub fn list_kind(&self) -> ListKind {
        match self.num_fmt.as_str() {
            "bullet" | "none" => ListKind::Bullet,
            _ => ListKind::Ordered,
        }
    }
}

/// Abstract numbering definition.
#[derive(Debug, Clone, Default)]
pub struct AbstractNum {
    pub id: u32,
    pub levels: Vec<NumLevel>,
}

/// Concrete numbering instance (`w:num`).
#[derive(Debug, Clone, Default)]
pub struct NumInstance {
    pub num_id: u32,
    pub abstract_num_id: u32,
    /// `w:lvlOverride/w:startOverride` values by level
    pub start_overrides: HashMap<u8, u32>,
}

/// Numbering definitions of a package.
#[derive(Debug, Clone, Default)]
pub struct NumberingMap {
    pub abstract_nums: HashMap<u32, AbstractNum>,
    pub instances: HashMap<u32, NumInstance>,
}

impl NumberingMap {
    /// Parse numbering from XML content.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut map = NumberingMap::default();
        if xml.trim().is_empty() {
            return Ok(map);
        }

        let mut reader = quick_xml::Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut buf = Vec::new();
        let mut current_abstract: Option<AbstractNum> = None;
        let mut current_level: Option<NumLevel> = None;
        let mut current_num: Option<NumInstance> = None;
        let mut override_level: Option<u8> = None;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => match e.name().as_ref() {
                    b"w:abstractNum" => {
                        let mut abstract_num = AbstractNum::default();
                        for attr in e.attributes().flatten() {
                            if attr.key.as_ref() == b"w:abstractNumId" {
                                abstract_num.id =
                                    String::from_utf8_lossy(&attr.value).parse().unwrap_or(0);
                            }
                        }
                        current_abstract = Some(abstract_num);
                    }
                    b"w:lvl" if current_abstract.is_some() => {
                        let mut level = NumLevel {
                            level: 0,
                            start: 1,
                            num_fmt: "bullet".to_string(),
                            level_text: String::new(),
                        };
                        for attr in e.attributes().flatten() {
                            if attr.key.as_ref() == b"w:ilvl" {
                                level.level =
                                    String::from_utf8_lossy(&attr.value).parse().unwrap_or(0);
                            }
                        }
                        current_level = Some(level);
                    }
                    b"w:num" => {
                        let mut num = NumInstance::default();
                        for attr in e.attributes().flatten() {
                            if attr.key.as_ref() == b"w:numId" {
                                num.num_id =
                                    String::from_utf8_lossy(&attr.value).parse().unwrap_or(0);
                            }
                        }
                        current_num = Some(num);
                    }
                    b"w:lvlOverride" => {
                        for attr in e.attributes().flatten() {
                            if attr.key.as_ref() == b"w:ilvl" {
                                override_level = String::from_utf8_lossy(&attr.value).parse().ok();
                            }
                        }
                    }
                    _ => {}
                },
                Ok(Event::Empty(e)) => match e.name().as_ref() {
                    b"w:start" => {
                        if let (Some(level), Some(val)) = (current_level.as_mut(), get_val(&e)) {
                            level.start = val.parse().unwrap_or(1);
                        }
                    }
                    b"w:numFmt" => {
                        if let (Some(level), Some(val)) = (current_level.as_mut(), get_val(&e)) {
                            level.num_fmt = val;
                        }
                    }
                    b"w:lvlText" => {
                        if let (Some(level), Some(val)) = (current_level.as_mut(), get_val(&e)) {
                            level.level_text = val;
                        }
                    }
                    b"w:abstractNumId" => {
                        if let (Some(num), Some(val)) = (current_num.as_mut(), get_val(&e)) {
                            num.abstract_num_id = val.parse().unwrap_or(0);
                        }
                    }
                    b"w:startOverride" => {
                        let start = get_val(&e).and_then(|v| v.parse().ok());
                        if let (Some(num), Some(level), Some(start)) =
                            (current_num.as_mut(), override_level, start)
                        {
                            num.start_overrides.insert(level, start);
                        }
                    }
                    _ => {}
                },
                Ok(Event::End(e)) => match e.name().as_ref() {
                    b"w:abstractNum" => {
                        if let Some(abstract_num) = current_abstract.take() {
                            map.abstract_nums.insert(abstract_num.id, abstract_num);
                        }
                    }
                    b"w:lvl" => {
                        if let (Some(level), Some(abstract_num)) =
                            (current_level.take(), current_abstract.as_mut())
                        {
                            abstract_num.levels.push(level);
                        }
                    }
                    b"w:num" => {
                        if let Some(num) = current_num.take() {
                            map.instances.insert(num.num_id, num);
                        }
                    }
                    b"w:lvlOverride" => override_level = None,
                    _ => {}
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(Error::XmlParse(e.to_string())),
                _ => {}
            }
            buf.clear();
        }

        Ok(map)
    }

    pub fn contains_num(&self, num_id: u32) -> bool {
        self.instances.contains_key(&num_id)
    }

    /// Level definition behind a numbering id.
    pub fn level(&self, num_id: u32, level: u8) -> Option<&NumLevel> {
        let instance = self.instances.get(&num_id)?;
        let abstract_num = self.abstract_nums.get(&instance.abstract_num_id)?;
        abstract_num
            .levels
            .iter()
            .find(|l| l.level == level)
            .or_else(|| abstract_num.levels.first())
    }

    /// List kind and effective start value of a numbering id at a level.
    ///
    /// Returns `None` when the id or its abstract definition is missing.
    pub fn list_info(&self, num_id: u32, level: u8) -> Option<(ListKind, u32)> {
        let num_level = self.level(num_id, level)?;
        let start = self
            .instances
            .get(&num_id)
            .and_then(|i| i.start_overrides.get(&level).copied())
            .unwrap_or(num_level.start);
        Some((num_level.list_kind(), start))
    }

    pub fn max_num_id(&self) -> u32 {
        self.instances.keys().copied().max().unwrap_or(0)
    }

    pub fn max_abstract_id(&self) -> u32 {
        self.abstract_nums.keys().copied().max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NUMBERING: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<w:numbering xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
    <w:abstractNum w:abstractNumId="0">
        <w:lvl w:ilvl="0">
            <w:start w:val="1"/>
            <w:numFmt w:val="decimal"/>
            <w:lvlText w:val="%1."/>
        </w:lvl>
        <w:lvl w:ilvl="1">
            <w:start w:val="1"/>
            <w:numFmt w:val="bullet"/>
            <w:lvlText w:val="o"/>
        </w:lvl>
    </w:abstractNum>
    <w:abstractNum w:abstractNumId="3">
        <w:lvl w:ilvl="0"><w:start w:val="5"/><w:numFmt w:val="lowerRoman"/></w:lvl>
    </w:abstractNum>
    <w:num w:numId="1"><w:abstractNumId w:val="0"/></w:num>
    <w:num w:numId="2">
        <w:abstractNumId w:val="0"/>
        <w:lvlOverride w:ilvl="0"><w:startOverride w:val="4"/></w:lvlOverride>
    </w:num>
    <w:num w:numId="9"><w:abstractNumId w:val="3"/></w:num>
    <w:num w:numId="12"><w:abstractNumId w:val="42"/></w:num>
</w:numbering>"#;

    #[test]
    fn test_parse_numbering() {
        let map = NumberingMap::parse(NUMBERING).unwrap();
        assert_eq!(map.abstract_nums.len(), 2);
        assert_eq!(map.instances.len(), 4);
        assert_eq!(map.abstract_nums[&0].levels[0].num_fmt, "decimal");
        assert_eq!(map.max_num_id(), 12);
        assert_eq!(map.max_abstract_id(), 3);
    }

    #[test]
    fn test_list_info() {
        let map = NumberingMap::parse(NUMBERING).unwrap();
        assert_eq!(map.list_info(1, 0), Some((ListKind::Ordered, 1)));
        assert_eq!(map.list_info(1, 1), Some((ListKind::Bullet, 1)));
        assert_eq!(map.list_info(2, 0), Some((ListKind::Ordered, 4)));
        assert_eq!(map.list_info(9, 0), Some((ListKind::Ordered, 5)));
    }

    #[test]
    fn test_missing_definitions() {
        let map = NumberingMap::parse(NUMBERING).unwrap();
        // Abstract definition 42 does not exist
        assert_eq!(map.list_info(12, 0), None);
        assert_eq!(map.list_info(77, 0), None);
        assert!(NumberingMap::parse("").unwrap().is_empty());
    }
}
