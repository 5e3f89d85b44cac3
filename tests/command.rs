use mini_kv::{KvEngine, KvError, KvStore, Request, Response};

fn get(key: &str) -> Request {
    Request::Get { key: key.to_owned() }
}

fn set(key: &str, value: &str) -> Request {
    Request::Set {
        key: key.to_owned(),
        value: value.to_owned(),
    }
}

fn del(key: &str) -> Request {
    Request::Del { key: key.to_owned() }
}

#[test]
fn parse_verbs() {
    assert_eq!(Request::parse("GET Hello\n"), get("Hello"));
    assert_eq!(Request::parse("SET Hello World!\n"), set("Hello", "World!"));
    assert_eq!(Request::parse("DEL Hello\n"), del("Hello"));
}

#[test]
fn parse_without_terminator() {
    assert_eq!(Request::parse("GET Hello"), get("Hello"));
    assert_eq!(Request::parse("SET Hello World!"), set("Hello", "World!"));
}

#[test]
fn parse_strips_crlf() {
    assert_eq!(Request::parse("GET Hello\r\n"), get("Hello"));
    assert_eq!(Request::parse("SET a b\r"), set("a", "b"));
}

#[test]
fn get_and_del_keys_keep_spaces() {
    assert_eq!(Request::parse("GET hello world\n"), get("hello world"));
    assert_eq!(Request::parse("DEL hello world\n"), del("hello world"));
}

#[test]
fn set_key_is_first_token_and_value_is_the_rest() {
    assert_eq!(Request::parse("SET k1 k2 v\n"), set("k1", "k2 v"));
    assert_eq!(
        Request::parse("SET greeting hello there world\n"),
        set("greeting", "hello there world")
    );
    assert_eq!(Request::parse("SET k \n"), set("k", ""));
}

#[test]
fn malformed_requests_are_unrecognized() {
    for raw in &[
        "",
        "\n",
        "GET",
        "GET\n",
        "GET \n",
        "DEL\n",
        "DEL \n",
        "SET\n",
        "SET key\n",
        "SET  value\n",
        "get key\n",
        "FOO bar\n",
        "GETkey\n",
    ] {
        assert_eq!(Request::parse(raw), Request::Unrecognized, "{:?}", raw);
    }
}

#[test]
fn invalid_utf8_is_unrecognized() {
    assert_eq!(Request::from_bytes(b"GET \xff\xfe\n"), Request::Unrecognized);
    assert_eq!(Request::from_bytes(b"GET key\n"), get("key"));
}

#[test]
fn execute_round_trip() {
    let store = KvStore::new();

    assert_eq!(set("Hello", "World!").execute(&store), Response::Success);
    assert_eq!(
        get("Hello").execute(&store),
        Response::Value("World!".to_owned())
    );
    assert_eq!(del("Hello").execute(&store), Response::Success);
    assert_eq!(get("Hello").execute(&store), Response::Null);
    assert_eq!(del("Hello").execute(&store), Response::Null);
}

#[test]
fn unrecognized_does_not_touch_the_store() {
    let store = KvStore::new();
    store.set("bar".to_owned(), "baz".to_owned());

    let resp = Request::parse("FOO bar\n").execute(&store);

    assert_eq!(resp, Response::Unrecognized);
    assert_eq!(store.len(), 1);
    assert_eq!(store.get("bar"), Some("baz".to_owned()));
}

#[test]
fn responses_use_the_wire_encoding() {
    assert_eq!(Response::Value("World!".to_owned()).to_string(), "$World!\n");
    assert_eq!(Response::Null.to_string(), "NULL!\n");
    assert_eq!(Response::Success.to_string(), "SUCCESS!\n");
    assert_eq!(
        Response::Unrecognized.to_string(),
        "VERB COULD NOT BE PARSED!\n"
    );
}

#[test]
fn parse_responses() {
    assert_eq!(
        Response::parse("$hello world\n").unwrap(),
        Response::Value("hello world".to_owned())
    );
    assert_eq!(Response::parse("$\n").unwrap(), Response::Value(String::new()));
    assert_eq!(Response::parse("NULL!\n").unwrap(), Response::Null);
    assert_eq!(Response::parse("SUCCESS!\n").unwrap(), Response::Success);
    assert_eq!(
        Response::parse("VERB COULD NOT BE PARSED!\n").unwrap(),
        Response::Unrecognized
    );
}

#[test]
fn parse_garbage_response() {
    for raw in &["", "OK\n", "$no-newline", "NULL!"] {
        match Response::parse(raw) {
            Err(KvError::Protocol(got)) => assert_eq!(got, *raw),
            other => panic!("expected a protocol error for {:?}, got {:?}", raw, other),
        }
    }
}
