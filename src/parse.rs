use nom::bytes::complete::tag;
use nom::character::complete::{char, digit1};
use nom::combinator::map_res;
use nom::sequence::{preceded, tuple};
use nom::IResult;

use super::error::{Error, Result};
use super::types::{MailboxStats, MessageInfo, OK};

fn number<T: std::str::FromStr>(input: &str) -> IResult<&str, T> {
    map_res(digit1, |digits: &str| digits.parse::<T>())(input)
}

/// `+OK <a> <b>`, each field separated by a single space.
fn counts(input: &str) -> IResult<&str, (u32, u64)> {
    preceded(
        tag(OK),
        tuple((preceded(char(' '), number), preceded(char(' '), number))),
    )(input)
}

fn parse_counts(fragment: &str) -> Result<(u32, u64)> {
    match counts(fragment) {
        Ok((rest, pair)) if rest.is_empty() || rest.starts_with(|c: char| c.is_ascii_whitespace()) => {
            Ok(pair)
        }
        _ => Err(Error::MalformedResponse(fragment.to_string())),
    }
}

/// Parse the reply to `STAT`: `+OK <message count> <size in octets>`.
pub fn parse_stat(fragment: &str) -> Result<MailboxStats> {
    let (message_count, total_size) = parse_counts(fragment)?;
    Ok(MailboxStats {
        message_count,
        total_size,
    })
}

/// Parse the reply to `LIST n`: `+OK <message number> <size in octets>`.
pub fn parse_list(fragment: &str) -> Result<MessageInfo> {
    let (id, size) = parse_counts(fragment)?;
    Ok(MessageInfo { id, size })
}
