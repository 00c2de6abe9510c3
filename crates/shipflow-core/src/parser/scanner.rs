//! バイト単位のスキャナ
//!
//! 区切り文字はすべてASCIIなので、バイト位置で切り出してもUTF-8境界を壊さない。

use super::MethodCall;

/// 文字列リテラルの境界を追跡する
///
/// `"..."` と `'...'` を扱い、通常リテラルではバックスラッシュエスケープを、
/// verbatim リテラル（`@"..."`）では `""` を解釈する。`'` は改行をまたがない。
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct LiteralTracker {
    quote: Option<u8>,
    verbatim: bool,
    escaped: bool,
    closed_verbatim: bool,
}

impl LiteralTracker {
    pub fn in_literal(&self) -> bool {
        self.quote.is_some()
    }

    /// 1バイト進める。そのバイトがリテラルの一部（引用符を含む）なら true
    pub fn feed(&mut self, byte: u8, prev: Option<u8>) -> bool {
        match self.quote {
            // 閉じていない文字リテラルは行末で終わらせる
            Some(b'\'') if byte == b'\n' => {
                self.quote = None;
                self.escaped = false;
                false
            }
            Some(quote) => {
                if self.escaped {
                    self.escaped = false;
                } else if byte == b'\\' && !self.verbatim {
                    self.escaped = true;
                } else if byte == quote {
                    self.quote = None;
                    self.closed_verbatim = self.verbatim;
                    self.verbatim = false;
                }
                true
            }
            None => {
                if byte == b'"' || byte == b'\'' {
                    // `@"a""b"` は閉じた直後に再度開くので verbatim を引き継ぐ
                    self.verbatim = byte == b'"'
                        && (prev == Some(b'@') || (prev == Some(b'"') && self.closed_verbatim));
                    self.quote = Some(byte);
                    return true;
                }
                self.closed_verbatim = false;
                false
            }
        }
    }
}

fn is_opener(byte: u8) -> bool {
    matches!(byte, b'(' | b'[' | b'{')
}

fn is_closer(byte: u8) -> bool {
    matches!(byte, b')' | b']' | b'}')
}

/// `open_pos` の `(` に対応する `)` の位置を返す
///
/// リテラル内の括弧は無視する。括弧の種類が食い違う場合やテキスト終端に達した場合は None。
pub fn find_closing_paren(text: &str, open_pos: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    if open_pos >= bytes.len() || bytes[open_pos] != b'(' {
        return None;
    }

    let mut stack: Vec<u8> = vec![b'('];
    let mut literal = LiteralTracker::default();
    let mut prev = Some(b'(');

    for (pos, &byte) in bytes.iter().enumerate().skip(open_pos + 1) {
        if literal.feed(byte, prev) {
            prev = Some(byte);
            continue;
        }
        prev = Some(byte);

        if is_opener(byte) {
            stack.push(byte);
        } else if is_closer(byte) {
            let opener = stack.pop()?;
            let matched = matches!(
                (opener, byte),
                (b'(', b')') | (b'[', b']') | (b'{', b'}')
            );
            if !matched {
                return None;
            }
            if stack.is_empty() {
                return Some(pos);
            }
        }
    }

    None
}

/// `open_pos` の `<` に対応する `>` の位置を返す（型パラメータ注釈用）
pub fn find_closing_angle(text: &str, open_pos: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    if open_pos >= bytes.len() || bytes[open_pos] != b'<' {
        return None;
    }

    let mut depth = 0usize;
    for (pos, &byte) in bytes.iter().enumerate().skip(open_pos) {
        match byte {
            b'<' => depth += 1,
            b'>' => {
                depth -= 1;
                if depth == 0 {
                    return Some(pos);
                }
            }
            // 型注釈の中に現れない文字が来たら注釈ではない
            b'(' | b')' | b';' | b'"' | b'=' => return None,
            _ => {}
        }
    }
    None
}

/// メソッドチェーン走査中の括弧不整合
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unbalanced {
    /// 不整合が見つかった `(` の位置
    pub at: usize,
}

/// 再帰下降スキャナのカーソル
#[derive(Debug, Clone)]
pub(crate) struct Cursor<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(text: &'a str, pos: usize) -> Self {
        Self { text, pos }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn rest(&self) -> &'a str {
        &self.text[self.pos.min(self.text.len())..]
    }

    pub fn peek(&self) -> Option<u8> {
        self.text.as_bytes().get(self.pos).copied()
    }

    pub fn skip_ws(&mut self) {
        while let Some(byte) = self.peek() {
            if !byte.is_ascii_whitespace() {
                break;
            }
            self.pos += 1;
        }
    }

    /// 指定文字なら消費して true
    pub fn eat(&mut self, byte: u8) -> bool {
        if self.peek() == Some(byte) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// 識別子を読む（`_` と英数字）
    pub fn ident(&mut self) -> Option<&'a str> {
        let start = self.pos;
        while let Some(byte) = self.peek() {
            let ok = byte == b'_'
                || byte.is_ascii_alphabetic()
                || (self.pos > start && byte.is_ascii_digit());
            if !ok {
                break;
            }
            self.pos += 1;
        }
        (self.pos > start).then(|| &self.text[start..self.pos])
    }

    /// `<...>` があれば読み飛ばす
    pub fn skip_type_args(&mut self) {
        if self.peek() == Some(b'<')
            && let Some(close) = find_closing_angle(self.text, self.pos)
        {
            self.pos = close + 1;
        }
    }

    /// `(` から対応する `)` までを読み、括弧内の生テキストを返す
    pub fn balanced_args(&mut self) -> Result<&'a str, Unbalanced> {
        let open = self.pos;
        let close = find_closing_paren(self.text, open).ok_or(Unbalanced { at: open })?;
        self.pos = close + 1;
        Ok(&self.text[open + 1..close])
    }

    /// `.Method(args)` の連続を読む
    ///
    /// `;` や `.Method(` 以外のものが来たところで止まる。
    /// プロパティアクセス（`.Resource` のように括弧が続かないもの）もチェーン終端として扱う。
    pub fn method_calls(&mut self) -> Result<Vec<MethodCall>, Unbalanced> {
        let mut calls = Vec::new();

        loop {
            let checkpoint = self.pos;
            self.skip_ws();
            if !self.eat(b'.') {
                self.pos = checkpoint;
                break;
            }
            self.skip_ws();
            let Some(method) = self.ident() else {
                self.pos = checkpoint;
                break;
            };
            self.skip_ws();
            self.skip_type_args();
            self.skip_ws();
            if self.peek() != Some(b'(') {
                self.pos = checkpoint;
                break;
            }
            let raw_args = self.balanced_args()?;
            calls.push(MethodCall::new(method, raw_args));
        }

        Ok(calls)
    }
}
