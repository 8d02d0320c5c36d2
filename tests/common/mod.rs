#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Command;

pub const PERSON_XSD: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:element name="person">
    <xs:complexType>
      <xs:sequence>
        <xs:element name="name" type="xs:string"/>
        <xs:element name="age" type="xs:integer"/>
      </xs:sequence>
    </xs:complexType>
  </xs:element>
</xs:schema>
"#;

/// Conforms to [`PERSON_XSD`]
pub const VALID_PERSON: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<person>
  <name>Ada</name>
  <age>36</age>
</person>
"#;

/// `<age>abc</age>` sits on line 4
pub const BAD_AGE_PERSON: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<person>
  <name>Ada</name>
  <age>abc</age>
</person>
"#;

pub const NUMBERS_XSD: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:element name="numbers">
    <xs:complexType>
      <xs:sequence>
        <xs:element name="n" type="xs:integer" maxOccurs="unbounded"/>
      </xs:sequence>
    </xs:complexType>
  </xs:element>
</xs:schema>
"#;

/// Two independent type violations, on lines 3 and 5
pub const TWO_BAD_NUMBERS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<numbers>
  <n>x</n>
  <n>2</n>
  <n>y</n>
</numbers>
"#;

/// True when a real `xmllint` is on PATH; integration tests skip otherwise
pub fn xmllint_available() -> bool {
    let available = Command::new("xmllint")
        .arg("--version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false);
    if !available {
        eprintln!("xmllint not found on PATH, skipping");
    }
    available
}

pub fn write_fixture(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

pub fn list_dir(dir: &Path) -> Vec<PathBuf> {
    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    entries.sort();
    entries
}
