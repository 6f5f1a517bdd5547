use nullable_generic::{to_json_string, NullString, TimestampMs, Value};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
struct User {
    name: NullString,
    nickname: NullString,
    last_login: TimestampMs,
}

fn main() -> anyhow::Result<()> {
    let mut user: User = serde_json::from_str(
        r#"{"name":"Kit","nickname":null,"last_login":"2013-04-27T10:49:52Z"}"#,
    )?;

    println!("name      = {:?}", user.name.weak());
    println!("nickname  = {:?}", user.nickname.weak());
    println!("logged in = {}", user.last_login.time());

    user.nickname.set(7_i64)?;
    if let Err(err) = user.last_login.set("1367059792") {
        println!("rejected: {err}");
    }

    let row: Vec<Value> = vec![
        user.name.value(),
        user.nickname.value(),
        user.last_login.value(),
    ];
    println!("row       = {row:?}");
    println!("json      = {}", to_json_string(&user)?);

    Ok(())
}
