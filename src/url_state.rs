//! Shareable view state in the query string: `?room=<id>&i=<1-based index>`.

use url::Url;

use crate::catalog::Museum;

pub const ROOM_PARAM: &str = "room";
pub const INDEX_PARAM: &str = "i";

/// Read a query parameter
pub fn get_param(url: &Url, name: &str) -> Option<String> {
    url.query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

/// Set a query parameter in place, keeping the others. An empty value
/// removes the parameter.
pub fn set_param(url: &mut Url, name: &str, value: &str) {
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != name)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    let mut pairs = kept;
    if !value.is_empty() {
        pairs.push((name.to_string(), value.to_string()));
    }

    if pairs.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(pairs);
    }
}

/// Room and photo requested by a URL, before validation
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ViewParams {
    pub room: Option<String>,
    /// 1-based photo number as written in the URL
    pub photo: Option<String>,
}

impl ViewParams {
    pub fn from_url(url: &Url) -> Self {
        Self {
            room: get_param(url, ROOM_PARAM),
            photo: get_param(url, INDEX_PARAM),
        }
    }

    /// Resolve to (room index, 0-based photo index).
    ///
    /// Unknown rooms fall back to the default room, then to the first room.
    /// Unparsable or out-of-range photo numbers fall back to 0.
    pub fn resolve(&self, museum: &Museum) -> (usize, usize) {
        let room_id = self.room.as_deref().unwrap_or(&museum.default_room_id);
        let room_index = museum
            .room_index(room_id)
            .or_else(|| museum.room_index(&museum.default_room_id))
            .unwrap_or(0);

        let photo_count = museum.rooms.get(room_index).map_or(0, |room| room.photos.len());
        let photo_index = self
            .photo
            .as_deref()
            .and_then(leading_int)
            .map(|number| number - 1)
            .filter(|&index| index >= 0 && (index as usize) < photo_count)
            .map_or(0, |index| index as usize);

        (room_index, photo_index)
    }
}

/// Integer prefix of `raw` after leading whitespace, so `2abc` and `2.5`
/// both read as 2
fn leading_int(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (negative, rest) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
    let number = rest[..end].parse::<i64>().ok()?;
    Some(if negative { -number } else { number })
}

/// Write the current view into `url`
pub fn write_view(url: &mut Url, room_id: &str, photo_index: usize) {
    set_param(url, ROOM_PARAM, room_id);
    set_param(url, INDEX_PARAM, &(photo_index + 1).to_string());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn museum() -> Museum {
        Museum::builtin().unwrap()
    }

    #[test]
    fn resolves_room_and_photo() {
        let url = Url::parse("https://museum.test/rooms.html?room=labs&i=2").unwrap();
        assert_eq!(ViewParams::from_url(&url).resolve(&museum()), (2, 1));
    }

    #[test]
    fn defaults_on_missing_or_bad_values() {
        let m = museum();
        let bare = Url::parse("https://museum.test/rooms.html").unwrap();
        assert_eq!(ViewParams::from_url(&bare).resolve(&m), (0, 0));

        let unknown = Url::parse("https://museum.test/?room=attic&i=3").unwrap();
        assert_eq!(ViewParams::from_url(&unknown).resolve(&m), (0, 2));

        let out_of_range = Url::parse("https://museum.test/?room=labs&i=99").unwrap();
        assert_eq!(ViewParams::from_url(&out_of_range).resolve(&m), (2, 0));

        let garbage = Url::parse("https://museum.test/?room=labs&i=abc").unwrap();
        assert_eq!(ViewParams::from_url(&garbage).resolve(&m), (2, 0));

        let zero = Url::parse("https://museum.test/?room=labs&i=0").unwrap();
        assert_eq!(ViewParams::from_url(&zero).resolve(&m), (2, 0));
    }

    #[test]
    fn index_reads_leading_digits() {
        let m = museum();
        let suffixed = Url::parse("https://museum.test/?room=labs&i=2abc").unwrap();
        assert_eq!(ViewParams::from_url(&suffixed).resolve(&m), (2, 1));

        let fractional = Url::parse("https://museum.test/?room=labs&i=2.5").unwrap();
        assert_eq!(ViewParams::from_url(&fractional).resolve(&m), (2, 1));

        assert_eq!(leading_int(" 12px"), Some(12));
        assert_eq!(leading_int("-3"), Some(-3));
        assert_eq!(leading_int("-"), None);
        assert_eq!(leading_int(".5"), None);
    }

    #[test]
    fn write_keeps_other_params() {
        let mut url = Url::parse("https://museum.test/rooms.html?theme=dark&i=4").unwrap();
        write_view(&mut url, "sports", 1);

        assert_eq!(get_param(&url, "theme").as_deref(), Some("dark"));
        assert_eq!(get_param(&url, ROOM_PARAM).as_deref(), Some("sports"));
        assert_eq!(get_param(&url, INDEX_PARAM).as_deref(), Some("2"));
        assert_eq!(ViewParams::from_url(&url).resolve(&museum()), (3, 1));
    }

    #[test]
    fn empty_value_removes_param() {
        let mut url = Url::parse("https://museum.test/?room=labs").unwrap();
        set_param(&mut url, ROOM_PARAM, "");
        assert_eq!(url.query(), None);
    }
}
