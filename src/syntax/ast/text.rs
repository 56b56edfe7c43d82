use std::iter::FromIterator;

/// A text literal with interpolations.
///
/// Stored as a leading string followed by `(interpolated expression, following string)` pairs,
/// so that `"a${x}b${y}c"` is `head = "a"`, `tail = [(x, "b"), (y, "c")]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InterpolatedText<SubExpr> {
    head: String,
    tail: Vec<(SubExpr, String)>,
}

impl<SubExpr> From<(String, Vec<(SubExpr, String)>)>
    for InterpolatedText<SubExpr>
{
    fn from(x: (String, Vec<(SubExpr, String)>)) -> Self {
        InterpolatedText {
            head: x.0,
            tail: x.1,
        }
    }
}

impl<SubExpr> From<String> for InterpolatedText<SubExpr> {
    fn from(s: String) -> Self {
        InterpolatedText {
            head: s,
            tail: vec![],
        }
    }
}

impl<SubExpr> From<&str> for InterpolatedText<SubExpr> {
    fn from(s: &str) -> Self {
        InterpolatedText::from(s.to_owned())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InterpolatedTextContents<SubExpr> {
    Text(String),
    Expr(SubExpr),
}

impl<SubExpr> InterpolatedTextContents<SubExpr> {
    pub fn is_empty(&self) -> bool {
        use InterpolatedTextContents::{Expr, Text};
        match self {
            Expr(_) => false,
            Text(s) => s.is_empty(),
        }
    }
}

impl<SubExpr> InterpolatedText<SubExpr> {
    /// Build a text literal from `(prefix, interpolation)` chunks and a final suffix.
    pub fn from_chunks(chunks: Vec<(String, SubExpr)>, suffix: String) -> Self {
        let mut text = InterpolatedText {
            head: String::new(),
            tail: Vec::with_capacity(chunks.len()),
        };
        let mut pending = None;
        for (prefix, e) in chunks {
            match pending.take() {
                None => text.head = prefix,
                Some(prev) => text.tail.push((prev, prefix)),
            }
            pending = Some(e);
        }
        match pending {
            None => text.head = suffix,
            Some(prev) => text.tail.push((prev, suffix)),
        }
        text
    }

    pub fn head(&self) -> &str {
        &self.head
    }

    pub fn tail(&self) -> &[(SubExpr, String)] {
        &self.tail
    }

    /// The literal contents, if there are no interpolations.
    pub fn as_plain_text(&self) -> Option<&str> {
        if self.tail.is_empty() {
            Some(&self.head)
        } else {
            None
        }
    }

    pub fn traverse_ref<'a, SubExpr2, E, F>(
        &'a self,
        mut f: F,
    ) -> Result<InterpolatedText<SubExpr2>, E>
    where
        F: FnMut(&'a SubExpr) -> Result<SubExpr2, E>,
    {
        Ok(InterpolatedText {
            head: self.head.clone(),
            tail: self
                .tail
                .iter()
                .map(|(e, s)| Ok((f(e)?, s.clone())))
                .collect::<Result<_, _>>()?,
        })
    }

    pub fn iter<'a>(
        &'a self,
    ) -> impl Iterator<Item = InterpolatedTextContents<&'a SubExpr>> + 'a {
        use std::iter::once;
        use InterpolatedTextContents::{Expr, Text};
        let exprs = self.tail.iter().flat_map(|(e, s)| {
            once(Expr(e)).chain(once(Text(s.clone())))
        });
        once(Text(self.head.clone()))
            .chain(exprs)
            .filter(|c| !c.is_empty())
    }
}

impl<SubExpr> FromIterator<InterpolatedTextContents<SubExpr>>
    for InterpolatedText<SubExpr>
{
    // Adjacent text pieces are concatenated.
    fn from_iter<T>(iter: T) -> Self
    where
        T: IntoIterator<Item = InterpolatedTextContents<SubExpr>>,
    {
        let mut res = InterpolatedText {
            head: String::new(),
            tail: Vec::new(),
        };
        for x in iter {
            match x {
                InterpolatedTextContents::Text(s) => match res.tail.last_mut() {
                    Some((_, crnt)) => crnt.push_str(&s),
                    None => res.head.push_str(&s),
                },
                InterpolatedTextContents::Expr(e) => {
                    res.tail.push((e, String::new()))
                }
            }
        }
        res
    }
}
