use assert_json_diff::assert_json_eq;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::fs::File;
use std::io;
use std::io::ErrorKind;
use std::path::Path;
use std::str::FromStr;
use ump_consent::expiry::ExpiryPolicy;
use ump_consent::signals::ConsentSignals;
use ump_consent::storage::{ConsentStorageMut, MemoryStorage, publish_tc_string};
use ump_consent::tcstring::TcHeader;

fn load_from_file<T: DeserializeOwned, P: AsRef<Path>>(p: P) -> io::Result<T> {
    let f = File::open(p)?;
    serde_json::from_reader(&f).map_err(|e| io::Error::new(ErrorKind::InvalidData, e.to_string()))
}

/// Storage values, optionally completed by a TC string, and the decisions they lead to.
#[derive(Deserialize)]
pub struct DecisionCase {
    #[serde(default)]
    storage: Map<String, Value>,
    tc_string: Option<String>,
    vendor_id: u16,
    now_millis: i64,
    expected: Value,
}

impl DecisionCase {
    pub fn load_from_file<P: AsRef<Path>>(p: P) -> io::Result<Self> {
        load_from_file(p)
    }

    fn storage(&self) -> MemoryStorage {
        let mut storage = MemoryStorage::new();

        for (key, value) in &self.storage {
            match value {
                Value::Number(n) => storage.set_int(key, n.as_i64().expect("integer value")),
                Value::String(s) => storage.set_string(key, s.clone()),
                v => panic!("unsupported value for {key}: {v}"),
            }
        }

        if let Some(tc_string) = &self.tc_string {
            if let Err(e) = publish_tc_string(&mut storage, tc_string) {
                panic!("TC string decode error: {:?}", e.to_string());
            }
        }

        storage
    }

    pub fn assert_json_matches(&self) {
        let signals = ConsentSignals::load(&self.storage());
        let decisions = signals.decisions(self.vendor_id, &ExpiryPolicy::default(), self.now_millis);

        assert_json_eq!(decisions, self.expected);
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "snake_case")]
enum ExpectedHeader {
    Header(Value),
    Error(String),
}

/// A TC string and either its decoded core segment or the decode error message.
#[derive(Deserialize)]
pub struct HeaderCase {
    tc_string: String,
    expected: ExpectedHeader,
}

impl HeaderCase {
    pub fn load_from_file<P: AsRef<Path>>(p: P) -> io::Result<Self> {
        load_from_file(p)
    }

    pub fn assert_json_matches(&self) {
        let decoded = TcHeader::from_str(&self.tc_string);

        match (&self.expected, decoded) {
            (ExpectedHeader::Header(expected), Ok(header)) => assert_json_eq!(header, expected),
            (ExpectedHeader::Error(expected), Err(e)) => assert_eq!(&e.to_string(), expected),
            (ExpectedHeader::Header(_), Err(e)) => panic!("TC string decode error: {e}"),
            (ExpectedHeader::Error(expected), Ok(header)) => {
                panic!("expected error {expected:?}, decoded {header:?}")
            }
        }
    }
}
