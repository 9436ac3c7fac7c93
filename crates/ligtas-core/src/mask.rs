//! Masking for the reporter-facing view of a case.

/// Keep the first and last character of each word, star out the rest.
/// Words of one or two characters are left as they are.
pub fn mask_name(name: &str) -> String {
  name
    .split(' ')
    .map(|word| {
      let chars: Vec<char> = word.chars().collect();
      match chars.as_slice() {
        [first, middle @ .., last] if !middle.is_empty() => {
          let mut out = String::with_capacity(word.len());
          out.push(*first);
          out.extend(std::iter::repeat_n('*', middle.len()));
          out.push(*last);
          out
        }
        _ => word.to_owned(),
      }
    })
    .collect::<Vec<_>>()
    .join(" ")
}

/// Show the first two digits and the last one; numbers too short to mask
/// meaningfully are starred out entirely.
pub fn mask_phone(phone: &str) -> String {
  let chars: Vec<char> = phone.chars().collect();
  if chars.len() < 7 {
    return "*".repeat(chars.len());
  }
  let mut out: String = chars[..2].iter().collect();
  out.push_str("********");
  out.push(chars[chars.len() - 1]);
  out
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn names_keep_first_and_last_letters() {
    assert_eq!(mask_name("Juan Dela Cruz"), "J**n D**a C**z");
    assert_eq!(mask_name("Jo Li"), "Jo Li");
    assert_eq!(mask_name(""), "");
  }

  #[test]
  fn phones_keep_two_leading_and_one_trailing_digit() {
    assert_eq!(mask_phone("09171234567"), "09********7");
    assert_eq!(mask_phone("12345"), "*****");
  }
}
