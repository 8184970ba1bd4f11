use std::borrow::Cow;
use tzpass_derive::tzpass_error;

#[tzpass_error]
pub enum DemoError {
    #[error("IO error{}: {source}", format_context(.context))]
    Io {
        #[source]
        source: std::io::Error,
        context: Option<Cow<'static, str>>,
    },

    #[error("Format error{}: {message}", format_context(.context))]
    Format { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn read_missing() -> Result<Vec<u8>, DemoError> {
    std::fs::read("/definitely/not/here").context("Reading fixture")
}

fn main() {
    let err = read_missing().unwrap_err();
    assert!(err.to_string().starts_with("IO error (Reading fixture): "));

    let err: DemoError = "boom".into();
    assert_eq!(err.to_string(), "Internal error: boom");

    let res: Result<(), DemoError> =
        Err(DemoError::Format { message: "bad padding".into(), context: None });
    let err = res.context("Decrypting body").unwrap_err();
    assert_eq!(err.to_string(), "Format error (Decrypting body): bad padding");
}
