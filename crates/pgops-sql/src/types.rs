//! Column type rendering, shared by CREATE TABLE and vector-table scaffolding

use pgops_ir::{ColumnDefinition, DataType, ModelError};

use crate::Result;

const DEFAULT_CHAR_LENGTH: u32 = 255;
const DEFAULT_PRECISION: (u32, u32) = (10, 2);

/// SQL type token for a column: `vector(N)`, `varchar(255)`, `numeric(10,2)`, ...
pub fn format_data_type(column: &ColumnDefinition) -> Result<String> {
    let name = column.data_type.sql_name();
    let token = match column.data_type {
        DataType::Vector => match column.vector_dimensions {
            Some(dimensions) if dimensions > 0 => format!("{}({})", name, dimensions),
            _ => return Err(ModelError::MissingVectorDimensions(column.name.clone()).into()),
        },
        DataType::Varchar | DataType::Char => format!("{}({})", name, DEFAULT_CHAR_LENGTH),
        DataType::Decimal | DataType::Numeric => {
            format!("{}({},{})", name, DEFAULT_PRECISION.0, DEFAULT_PRECISION.1)
        }
        _ => name.to_string(),
    };
    Ok(token)
}
