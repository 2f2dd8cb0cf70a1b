use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{LedgerError, Result, StoreContext};
use crate::models::{Category, CategoryInput};

const COLUMNS: &str = "id, account_id, name, color";

pub fn insert(conn: &Connection, account_id: i64, input: &CategoryInput) -> Result<Category> {
    conn.execute(
        "INSERT INTO categories (account_id, name, color) VALUES (?1, ?2, ?3)",
        params![account_id, input.name, input.color],
    )
    .context(format!("insert category '{}'", input.name))?;
    get(conn, conn.last_insert_rowid())
}

pub fn get(conn: &Connection, id: i64) -> Result<Category> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM categories WHERE id = ?1"),
        [id],
        Category::from_row,
    )
    .optional()
    .context(format!("load category {id}"))?
    .ok_or_else(|| LedgerError::not_found("category", id))
}

pub fn list(conn: &Connection, account_id: i64) -> Result<Vec<Category>> {
    let mut stmt = conn
        .prepare(&format!("SELECT {COLUMNS} FROM categories WHERE account_id = ?1 ORDER BY name"))
        .context("list categories")?;
    let rows = stmt
        .query_map([account_id], Category::from_row)
        .context(format!("list categories of account {account_id}"))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .context("scan categories")?;
    Ok(rows)
}

pub fn update(conn: &Connection, category: &Category) -> Result<Category> {
    let changed = conn
        .execute(
            "UPDATE categories SET name = ?1, color = ?2 WHERE id = ?3",
            params![category.name, category.color, category.id],
        )
        .context(format!("update category {}", category.id))?;
    if changed == 0 {
        return Err(LedgerError::not_found("category", category.id));
    }
    get(conn, category.id)
}

/// Detach the category from transactions and templates, then remove it.
pub fn delete(conn: &Connection, id: i64) -> Result<()> {
    conn.execute("UPDATE transactions SET category_id = NULL WHERE category_id = ?1", [id])
        .context(format!("detach category {id} from transactions"))?;
    conn.execute("UPDATE recurrings SET category_id = NULL WHERE category_id = ?1", [id])
        .context(format!("detach category {id} from recurrings"))?;
    conn.execute("DELETE FROM categories WHERE id = ?1", [id])
        .context(format!("delete category {id}"))?;
    Ok(())
}
