//! PostgreSQL source client
//!
//! Reads a whole table into a [`Table`], keeping column order and mapping
//! PostgreSQL types onto [`ColumnType`].

use crate::table::{Column, ColumnType, Schema, Table, Value};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use eyre::{Context, Result};
use sqlx::postgres::{PgConnectOptions, PgConnection, PgRow};
use sqlx::{Column as _, Connection, Executor, Row, Statement, TypeInfo, ValueRef};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// How a PostgreSQL column is decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decoder {
    Int2,
    Int4,
    Int8,
    Float4,
    Float8,
    Bool,
    Date,
    Timestamp,
    Timestamptz,
    Text,
    /// `NUMERIC`, selected as `float8`
    Numeric,
    /// Any other type, selected as `text`
    AsText,
}

impl Decoder {
    fn for_type(type_name: &str) -> Self {
        match type_name {
            "INT2" => Self::Int2,
            "INT4" => Self::Int4,
            "INT8" => Self::Int8,
            "FLOAT4" => Self::Float4,
            "FLOAT8" => Self::Float8,
            "BOOL" => Self::Bool,
            "DATE" => Self::Date,
            "TIMESTAMP" => Self::Timestamp,
            "TIMESTAMPTZ" => Self::Timestamptz,
            "TEXT" | "VARCHAR" | "BPCHAR" | "CHAR" | "\"CHAR\"" | "NAME" => Self::Text,
            "NUMERIC" => Self::Numeric,
            _ => Self::AsText,
        }
    }

    /// Select-list entry that produces a value this decoder can read
    fn select_expr(self, name: &str) -> String {
        let column = quote_identifier(name);
        match self {
            Self::Numeric => format!("{}::float8 AS {}", column, column),
            Self::AsText => format!("{}::text AS {}", column, column),
            _ => column,
        }
    }

    fn needs_cast(self) -> bool {
        matches!(self, Self::Numeric | Self::AsText)
    }

    fn column_type(self) -> ColumnType {
        match self {
            Self::Int2 | Self::Int4 | Self::Int8 => ColumnType::Integer,
            Self::Float4 | Self::Float8 | Self::Numeric => ColumnType::Float,
            Self::Date => ColumnType::Date,
            Self::Bool | Self::Timestamp | Self::Timestamptz | Self::Text | Self::AsText => {
                ColumnType::Text
            }
        }
    }

    fn decode(self, row: &PgRow, index: usize) -> Result<Value, sqlx::Error> {
        if row.try_get_raw(index)?.is_null() {
            return Ok(Value::Null);
        }
        let value = match self {
            Self::Int2 => Value::Integer(row.try_get::<i16, _>(index)?.into()),
            Self::Int4 => Value::Integer(row.try_get::<i32, _>(index)?.into()),
            Self::Int8 => Value::Integer(row.try_get::<i64, _>(index)?),
            Self::Float4 => Value::Float(row.try_get::<f32, _>(index)?.into()),
            Self::Float8 | Self::Numeric => Value::Float(row.try_get::<f64, _>(index)?),
            Self::Bool => Value::Text(bool_text(row.try_get::<bool, _>(index)?).to_string()),
            Self::Date => Value::Date(row.try_get::<NaiveDate, _>(index)?),
            Self::Timestamp => Value::Text(
                row.try_get::<NaiveDateTime, _>(index)?
                    .format(TIMESTAMP_FORMAT)
                    .to_string(),
            ),
            Self::Timestamptz => Value::Text(
                row.try_get::<DateTime<Utc>, _>(index)?
                    .format(TIMESTAMP_FORMAT)
                    .to_string(),
            ),
            Self::Text | Self::AsText => Value::Text(row.try_get::<String, _>(index)?),
        };
        Ok(value)
    }
}

fn bool_text(b: bool) -> &'static str {
    if b { "True" } else { "False" }
}

/// Quote an identifier for use in SQL, doubling embedded quotes
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// The query used to read an entire table
pub fn select_all_sql(table: &str) -> String {
    format!("SELECT * FROM {}", quote_identifier(table))
}

/// Select every column of `table`, casting the ones `decoders` cannot read
/// natively
fn select_columns_sql(table: &str, columns: &[Column], decoders: &[Decoder]) -> String {
    if !decoders.iter().any(|d| d.needs_cast()) {
        return select_all_sql(table);
    }
    let list: Vec<String> = columns
        .iter()
        .zip(decoders)
        .map(|(column, decoder)| decoder.select_expr(&column.name))
        .collect();
    format!("SELECT {} FROM {}", list.join(", "), quote_identifier(table))
}

/// PostgreSQL client that reads whole tables
///
/// A fresh connection is opened for every read and closed afterwards.
#[derive(Clone, Debug)]
pub struct PostgresClient {
    options: PgConnectOptions,
    display: String,
}

impl PostgresClient {
    pub fn new(host: &str, port: u16, database: &str, username: &str, password: &str) -> Self {
        let options = PgConnectOptions::new()
            .host(host)
            .port(port)
            .database(database)
            .username(username)
            .password(password);
        Self {
            options,
            display: format!("postgres://{}@{}:{}/{}", username, host, port, database),
        }
    }

    /// Read every row of `table` in the order the database returns them
    ///
    /// The column schema comes from the prepared statement, so an empty
    /// table still yields its columns. `NUMERIC` columns are read as floats
    /// and types without a native decoder are read as their text form.
    ///
    /// # Errors
    /// Returns an error if the database is unreachable or the table does not
    /// exist.
    pub async fn fetch_table(&self, table: &str) -> Result<Table> {
        let mut conn = PgConnection::connect_with(&self.options)
            .await
            .with_context(|| format!("Failed to connect to {}", self))?;

        let sql = select_all_sql(table);
        log::debug!("{}", sql);

        let (columns, decoders) = {
            let statement = conn
                .prepare(&sql)
                .await
                .with_context(|| format!("Failed to prepare query on table '{}'", table))?;
            describe_columns(
                statement
                    .columns()
                    .iter()
                    .map(|c| (c.name().to_string(), c.type_info().name().to_string())),
            )
        };

        let sql = select_columns_sql(table, &columns, &decoders);
        if decoders.iter().any(|d| d.needs_cast()) {
            log::debug!("{}", sql);
        }

        let rows = conn
            .fetch_all(sql.as_str())
            .await
            .with_context(|| format!("Failed to read table '{}'", table))?;

        let mut output = Table::new(Schema::new(columns.clone()));
        for (i, row) in rows.iter().enumerate() {
            let values = decoders
                .iter()
                .enumerate()
                .map(|(index, decoder)| {
                    decoder.decode(row, index).with_context(|| {
                        format!("Row {}: cannot decode column '{}'", i, columns[index].name)
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            output.push_row(values)?;
        }

        if let Err(e) = conn.close().await {
            log::warn!("Failed to close connection to {}: {}", self, e);
        }

        log::info!("Read {} row(s) from table '{}'", output.len(), table);
        Ok(output)
    }
}

fn describe_columns(
    columns: impl Iterator<Item = (String, String)>,
) -> (Vec<Column>, Vec<Decoder>) {
    let mut schema = Vec::new();
    let mut decoders = Vec::new();
    for (name, type_name) in columns {
        let decoder = Decoder::for_type(&type_name);
        if decoder == Decoder::AsText {
            log::debug!("Reading column '{}' of type {} as text", name, type_name);
        }
        schema.push(Column::new(name, decoder.column_type()));
        decoders.push(decoder);
    }
    (schema, decoders)
}

impl std::fmt::Display for PostgresClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display)
    }
}
