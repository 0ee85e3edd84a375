//! Parser for the output descriptor subset accepted in place of an xpub:
//!
//! ```text
//! kind "(" [ "[" fingerprint "/" bip "'" "/" coin ["'"] "/" account ["'"] "]" ]
//!      xpub [ "/" ( index | "{" index ("," index)* "}" | "<" index (";" index)* ">" ) "/*" ]
//! ")" [ "#" checksum ]
//! ```
//!
//! where `kind` is `pkh`, `wpkh`, `sh(wpkh` or `tr`. A trailing checksum is
//! accepted but not verified.

use crate::error::DescriptorError;

use super::DerivationKind;

const CHECKSUM_LEN: usize = 8;
const CHECKSUM_CHARSET: &str = "qpzry9x8gf2tvdw0s3jn54khce6mua7l";

/// Pieces of a descriptor string, before the key is decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DescriptorParts<'a> {
    pub kind: DerivationKind,
    /// Purpose from the key origin, if one was given.
    pub bip: Option<&'a str>,
    pub xpub: &'a str,
    pub change_indexes: Option<Vec<u32>>,
}

/// Whether `s` looks like a descriptor rather than a bare extended key.
pub(crate) fn is_descriptor(s: &str) -> bool {
    s.contains('(')
}

pub(crate) fn parse(s: &str) -> Result<DescriptorParts<'_>, DescriptorError> {
    let mut c = Cursor { rest: s };

    let (kind, depth) = if c.eat("sh(wpkh(") {
        (DerivationKind::P2shP2wpkh, 2)
    } else if c.eat("wpkh(") {
        (DerivationKind::P2wpkh, 1)
    } else if c.eat("pkh(") {
        (DerivationKind::P2pkh, 1)
    } else if c.eat("tr(") {
        (DerivationKind::P2tr, 1)
    } else {
        let name = s.split('(').next().unwrap_or_default();
        return Err(DescriptorError::UnsupportedKind(name.to_owned()));
    };

    let bip = if c.eat("[") {
        Some(parse_origin(&mut c)?)
    } else {
        None
    };

    let xpub = c.word();
    if xpub.is_empty() {
        return Err(invalid("missing extended key"));
    }

    let change_indexes = if c.eat("/") {
        let indexes = if c.eat("{") {
            c.list(',', '}')?
        } else if c.eat("<") {
            c.list(';', '>')?
        } else {
            vec![c.index()?]
        };
        if !c.eat("/*") {
            return Err(invalid("child path must end with /*"));
        }
        Some(indexes)
    } else {
        None
    };

    for _ in 0..depth {
        if !c.eat(")") {
            return Err(invalid("unbalanced parentheses"));
        }
    }
    if c.eat("#") {
        let valid = c.rest.len() == CHECKSUM_LEN
            && c.rest.chars().all(|ch| CHECKSUM_CHARSET.contains(ch));
        if !valid {
            return Err(invalid("malformed checksum"));
        }
        c.rest = "";
    }
    if !c.rest.is_empty() {
        return Err(invalid(&format!("unexpected trailing input `{}`", c.rest)));
    }

    Ok(DescriptorParts {
        kind,
        bip,
        xpub,
        change_indexes,
    })
}

/// `fingerprint/bip'/coin'/account']`, the opening bracket already eaten.
/// Returns the purpose.
fn parse_origin<'a>(c: &mut Cursor<'a>) -> Result<&'a str, DescriptorError> {
    if c.word().is_empty() || !c.eat("/") {
        return Err(invalid("key origin needs a fingerprint"));
    }
    let bip = c.digits();
    if bip.is_empty() || !c.eat_hardened() {
        return Err(invalid("key origin purpose must be hardened"));
    }
    for level in ["coin type", "account"] {
        if !c.eat("/") || c.digits().is_empty() {
            return Err(invalid(&format!("key origin is missing the {level}")));
        }
        c.eat_hardened();
    }
    if !c.eat("]") {
        return Err(invalid("unterminated key origin"));
    }
    Ok(bip)
}

fn invalid(reason: &str) -> DescriptorError {
    DescriptorError::InvalidDescriptor(reason.to_owned())
}

// ==============================================================================
// Cursor
// ==============================================================================

struct Cursor<'a> {
    rest: &'a str,
}

impl<'a> Cursor<'a> {
    fn eat(&mut self, token: &str) -> bool {
        match self.rest.strip_prefix(token) {
            Some(rest) => {
                self.rest = rest;
                true
            }
            None => false,
        }
    }

    fn eat_hardened(&mut self) -> bool {
        self.eat("'") || self.eat("h")
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let end = self.rest.find(|ch| !pred(ch)).unwrap_or(self.rest.len());
        let (taken, rest) = self.rest.split_at(end);
        self.rest = rest;
        taken
    }

    /// Alphanumerics and underscores.
    fn word(&mut self) -> &'a str {
        self.take_while(|ch| ch.is_ascii_alphanumeric() || ch == '_')
    }

    fn digits(&mut self) -> &'a str {
        self.take_while(|ch| ch.is_ascii_digit())
    }

    fn index(&mut self) -> Result<u32, DescriptorError> {
        let digits = self.digits();
        digits
            .parse()
            .map_err(|_| invalid(&format!("invalid child index `{digits}`")))
    }

    fn list(&mut self, sep: char, close: char) -> Result<Vec<u32>, DescriptorError> {
        let mut out = vec![self.index()?];
        loop {
            let mut buf = [0u8; 4];
            if self.eat(close.encode_utf8(&mut buf)) {
                return Ok(out);
            }
            if !self.eat(sep.encode_utf8(&mut buf)) {
                return Err(invalid(&format!("expected `{sep}` or `{close}` in child list")));
            }
            out.push(self.index()?);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taproot_with_origin_and_checksum() {
        let parts = parse("tr([5c9e228d/86'/1'/0']tpubABC/{0,1}/*)#4rqwxvej").expect("valid");
        assert_eq!(parts.kind, DerivationKind::P2tr);
        assert_eq!(parts.bip, Some("86"));
        assert_eq!(parts.xpub, "tpubABC");
        assert_eq!(parts.change_indexes, Some(vec![0, 1]));
    }

    #[test]
    fn change_group_forms() {
        let single = parse("wpkh(zpubX/1/*)").expect("single index");
        assert_eq!(single.change_indexes, Some(vec![1]));
        let angle = parse("pkh(xpubX/<0;1;7>/*)").expect("angle list");
        assert_eq!(angle.change_indexes, Some(vec![0, 1, 7]));
        let none = parse("sh(wpkh(ypubX))").expect("no path");
        assert_eq!(none.kind, DerivationKind::P2shP2wpkh);
        assert_eq!(none.change_indexes, None);
        assert_eq!(none.bip, None);
    }

    #[test]
    fn malformed_descriptors() {
        for bad in [
            "wpkh(zpubX/1)",
            "wpkh(zpubX/{0,}/*)",
            "wpkh(zpubX/<0,1>/*)",
            "sh(wpkh(ypubX)",
            "wpkh([abc/84/0'/0']zpubX)",
            "wpkh([abc/84']zpubX)",
            "wpkh(zpubX)extra",
            "wpkh(zpubX)#short",
            "wpkh(/0/*)",
        ] {
            assert!(
                matches!(parse(bad), Err(DescriptorError::InvalidDescriptor(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn unsupported_kinds() {
        assert_eq!(
            parse("wsh(xpubX)"),
            Err(DescriptorError::UnsupportedKind("wsh".into()))
        );
        assert_eq!(
            parse("pk(xpubX)"),
            Err(DescriptorError::UnsupportedKind("pk".into()))
        );
    }

    #[test]
    fn hardened_suffix_h_is_accepted() {
        let parts = parse("wpkh([5c9e228d/84h/0h/0h]zpubX/0/*)").expect("valid");
        assert_eq!(parts.bip, Some("84"));
    }
}
