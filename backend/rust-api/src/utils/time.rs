use chrono::{DateTime, Utc};
use mongodb::bson::DateTime as BsonDateTime;

pub fn chrono_to_bson(dt: DateTime<Utc>) -> BsonDateTime {
    BsonDateTime::from_millis(dt.timestamp_millis())
}

/// Current time as a BSON datetime, millisecond precision.
pub fn bson_now() -> BsonDateTime {
    chrono_to_bson(Utc::now())
}
