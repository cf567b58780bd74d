use std::env::args;
use ump_consent::expiry::{ExpiryPolicy, now_millis};
use ump_consent::policy::GOOGLE_VENDOR_ID;
use ump_consent::signals::ConsentSignals;
use ump_consent::storage::{ConsentStorageMut, GDPR_APPLIES, MemoryStorage, publish_tc_string};

fn main() {
    let s = args()
        .nth(1)
        .unwrap_or_else(|| "CPXuQIAPXuQIAAfKABENB-CgACAAAAAAAAYgF5wAQF5gAAAA".to_string());

    let mut storage = MemoryStorage::new();
    storage.set_int(GDPR_APPLIES, 1);
    publish_tc_string(&mut storage, &s).expect("a valid TC string");

    let decisions = ConsentSignals::load(&storage).decisions(
        GOOGLE_VENDOR_ID,
        &ExpiryPolicy::default(),
        now_millis(),
    );

    #[cfg(feature = "serde")]
    println!("{}", serde_json::to_string_pretty(&decisions).unwrap());

    #[cfg(not(feature = "serde"))]
    println!("{decisions:#?}");
}
