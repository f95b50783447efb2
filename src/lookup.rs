/// The outcome of searching for something that is routinely absent.
///
/// Hazard files only exist when storms are active and the data catalog does not carry exposure
/// data for every country, so "nothing there" is an expected answer and callers decide whether it
/// ends the run or only skips a unit of work. Real failures still travel through `Result`.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    Found(T),
    NotFound(String),
}

impl<T> Lookup<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }

    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(val) => Some(val),
            Lookup::NotFound(_) => None,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Lookup<U> {
        match self {
            Lookup::Found(val) => Lookup::Found(f(val)),
            Lookup::NotFound(reason) => Lookup::NotFound(reason),
        }
    }
}
