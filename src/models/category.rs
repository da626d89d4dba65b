use crate::schema::categories;
use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Queryable, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// The category fields embedded into every article response.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CategorySummary {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub color: Option<String>,
}

impl From<Category> for CategorySummary {
    fn from(category: Category) -> Self {
        Self {
            id: category.id,
            name: category.name,
            slug: category.slug,
            description: category.description,
            color: category.color,
        }
    }
}

impl Category {
    pub fn find_by_slug(
        conn: &PgConnection,
        slug: &str,
    ) -> Result<Option<Self>, diesel::result::Error> {
        let category = categories::table
            .filter(categories::slug.eq(slug))
            .first::<Self>(conn)
            .optional()?;
        Ok(category)
    }

    pub fn find_id_by_slug(
        conn: &PgConnection,
        slug: &str,
    ) -> Result<Option<i32>, diesel::result::Error> {
        let id = categories::table
            .filter(categories::slug.eq(slug))
            .select(categories::id)
            .first::<i32>(conn)
            .optional()?;
        Ok(id)
    }
}

#[cfg(test)]
#[derive(Insertable)]
#[table_name = "categories"]
pub struct NewCategory<'a> {
    pub name: &'a str,
    pub slug: &'a str,
    pub description: Option<&'a str>,
    pub color: Option<&'a str>,
}

#[cfg(test)]
impl Category {
    pub fn create(conn: &PgConnection, name: &str, slug: &str) -> Result<Self, diesel::result::Error> {
        diesel::insert_into(categories::table)
            .values(NewCategory {
                name,
                slug,
                description: Some("fixture"),
                color: Some("#336699"),
            })
            .get_result(conn)
    }
}
