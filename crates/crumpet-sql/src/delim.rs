use std::fmt;

/// Comma delimited
pub(crate) struct Comma<L>(pub(crate) L);

/// Joined with ` AND `
pub(crate) struct And<L>(pub(crate) L);

impl<L> fmt::Display for Comma<L>
where
    L: IntoIterator + Clone,
    L::Item: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        delimited(f, self.0.clone(), ", ")
    }
}

impl<L> fmt::Display for And<L>
where
    L: IntoIterator + Clone,
    L::Item: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        delimited(f, self.0.clone(), " AND ")
    }
}

fn delimited<L>(f: &mut fmt::Formatter<'_>, items: L, delim: &str) -> fmt::Result
where
    L: IntoIterator,
    L::Item: fmt::Display,
{
    let mut s = "";
    for item in items {
        write!(f, "{s}{item}")?;
        s = delim;
    }
    Ok(())
}
