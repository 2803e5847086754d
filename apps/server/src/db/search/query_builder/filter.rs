use super::bind::{push_bool, push_float, push_int, push_text};
use super::BindValue;
use crate::db::search::predicate::{Condition, Predicate};
use crate::db::search::string_normalization::escape_like_pattern;

const LIKE_ESCAPE: &str = "ESCAPE E'\\\\'";

impl Predicate {
    /// Render as a SQL boolean expression over `packages p`, appending bind values.
    pub(crate) fn build_sql(&self, bind_params: &mut Vec<BindValue>) -> String {
        match self {
            Self::Leaf(condition) => condition.build_sql(bind_params),
            Self::And(children) => join_group(children, " AND ", "TRUE", bind_params),
            Self::Or(children) => join_group(children, " OR ", "FALSE", bind_params),
        }
    }
}

fn join_group(
    children: &[Predicate],
    separator: &str,
    empty: &str,
    bind_params: &mut Vec<BindValue>,
) -> String {
    if children.is_empty() {
        return empty.to_string();
    }
    let parts: Vec<String> = children
        .iter()
        .map(|child| child.build_sql(bind_params))
        .collect();
    format!("({})", parts.join(separator))
}

fn contains_pattern(value: &str) -> String {
    format!("%{}%", escape_like_pattern(value))
}

impl Condition {
    fn build_sql(&self, bind_params: &mut Vec<BindValue>) -> String {
        match self {
            Self::IsActive(v) => format!("p.is_active = ${}", push_bool(bind_params, *v)),
            Self::PackageType(t) => format!(
                "p.package_type = ${}",
                push_text(bind_params, t.as_str().to_string())
            ),
            Self::Difficulty(d) => format!(
                "p.difficulty = ${}",
                push_text(bind_params, d.as_str().to_string())
            ),
            Self::CompanyId(id) => format!("p.company_id = ${}", push_int(bind_params, *id)),
            Self::LanguageId(id) => format!(
                "EXISTS (SELECT 1 FROM package_languages plg \
                 WHERE plg.package_id = p.id AND plg.language_id = ${})",
                push_int(bind_params, *id)
            ),
            Self::Duration(v) => format!("p.duration = ${}", push_text(bind_params, v.clone())),
            Self::MinRating(v) => format!("p.rating >= ${}", push_float(bind_params, *v)),

            Self::MinAgeAllows(age) => {
                let idx = push_int(bind_params, i64::from(*age));
                format!("(p.min_age IS NULL OR p.min_age <= ${idx})")
            }
            Self::MaxAgeAllows(age) => {
                let idx = push_int(bind_params, i64::from(*age));
                format!("(p.max_age IS NULL OR p.max_age >= ${idx})")
            }
            Self::CapacityIncludes(travelers) => {
                let idx = push_int(bind_params, i64::from(*travelers));
                format!(
                    "((p.min_participants IS NULL OR p.min_participants <= ${idx}) \
                     AND (p.max_participants IS NULL OR p.max_participants >= ${idx}))"
                )
            }
            Self::MinParticipantsAtLeast(v) => format!(
                "p.min_participants >= ${}",
                push_int(bind_params, i64::from(*v))
            ),
            Self::MaxParticipantsAtMost(v) => format!(
                "p.max_participants <= ${}",
                push_int(bind_params, i64::from(*v))
            ),
            Self::HasHotelPickup(wanted) => {
                let exists = "EXISTS (SELECT 1 FROM package_pickup_details pd \
                              WHERE pd.package_id = p.id AND pd.hotel_pickup)";
                if *wanted {
                    exists.to_string()
                } else {
                    format!("NOT {exists}")
                }
            }

            Self::NameContains(v) => format!(
                "p.name ILIKE ${} {LIKE_ESCAPE}",
                push_text(bind_params, contains_pattern(v))
            ),
            Self::DescriptionContains(v) => format!(
                "p.description ILIKE ${} {LIKE_ESCAPE}",
                push_text(bind_params, contains_pattern(v))
            ),
            Self::IncludesItem(v) => format!(
                "EXISTS (SELECT 1 FROM unnest(p.included_items) AS item(value) \
                 WHERE lower(item.value) = lower(${}))",
                push_text(bind_params, v.clone())
            ),
            Self::CityNameContains(v) => format!(
                "EXISTS (SELECT 1 FROM cities c \
                 WHERE c.id = p.city_id AND c.name ILIKE ${} {LIKE_ESCAPE})",
                push_text(bind_params, contains_pattern(v))
            ),
            Self::CityRegionNameContains(v) => format!(
                "EXISTS (SELECT 1 FROM cities c JOIN regions r ON r.id = c.region_id \
                 WHERE c.id = p.city_id AND r.name ILIKE ${} {LIKE_ESCAPE})",
                push_text(bind_params, contains_pattern(v))
            ),
            Self::LocationCityNameContains(v) => format!(
                "EXISTS (SELECT 1 FROM package_locations pl JOIN cities lc ON lc.id = pl.city_id \
                 WHERE pl.package_id = p.id AND lc.name ILIKE ${} {LIKE_ESCAPE})",
                push_text(bind_params, contains_pattern(v))
            ),
            Self::LocationRegionNameContains(v) => format!(
                "EXISTS (SELECT 1 FROM package_locations pl JOIN cities lc ON lc.id = pl.city_id \
                 JOIN regions lr ON lr.id = lc.region_id \
                 WHERE pl.package_id = p.id AND lr.name ILIKE ${} {LIKE_ESCAPE})",
                push_text(bind_params, contains_pattern(v))
            ),

            Self::CityIdEq(id) => format!("p.city_id = ${}", push_int(bind_params, *id)),
            Self::LocationCityIdEq(id) => format!(
                "EXISTS (SELECT 1 FROM package_locations pl \
                 WHERE pl.package_id = p.id AND pl.city_id = ${})",
                push_int(bind_params, *id)
            ),
            Self::CityRegionIdEq(id) => format!(
                "EXISTS (SELECT 1 FROM cities c \
                 WHERE c.id = p.city_id AND c.region_id = ${})",
                push_int(bind_params, *id)
            ),
            Self::LocationRegionIdEq(id) => format!(
                "EXISTS (SELECT 1 FROM package_locations pl JOIN cities lc ON lc.id = pl.city_id \
                 WHERE pl.package_id = p.id AND lc.region_id = ${})",
                push_int(bind_params, *id)
            ),

            Self::MeetingPointWithin(bbox) => {
                let min_lat = push_float(bind_params, bbox.min_lat);
                let max_lat = push_float(bind_params, bbox.max_lat);
                let min_lng = push_float(bind_params, bbox.min_lng);
                let max_lng = push_float(bind_params, bbox.max_lng);
                format!(
                    "(p.meeting_point_lat BETWEEN ${min_lat} AND ${max_lat} \
                     AND p.meeting_point_lng BETWEEN ${min_lng} AND ${max_lng})"
                )
            }
        }
    }
}
