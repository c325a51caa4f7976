//! Column layout, client-side sorting and the terminal table renderer.

use crate::avatar::{AvatarGenerator, AvatarOptions};
use crate::constants::{GRID_AVATAR_RADIUS, GRID_AVATAR_SIZE};
use crate::pagination::Pagination;
use crate::row::PatientRow;
use crate::{FinderError, FinderResult};
use std::fmt::Write as _;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Column {
    Avatar,
    PatientId,
    FirstName,
    LastName,
    Gender,
    BirthDate,
    PhoneNumber,
    Actions,
}

/// Static layout of one column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColumnDef {
    pub column: Column,
    pub header: &'static str,
    /// Fixed width in pixels, where the grid pins one.
    pub width: Option<u32>,
    pub sortable: bool,
    pub resizable: bool,
    pub hidden: bool,
}

const fn data_column(column: Column, header: &'static str) -> ColumnDef {
    ColumnDef {
        column,
        header,
        width: None,
        sortable: true,
        resizable: true,
        hidden: false,
    }
}

pub const COLUMNS: [ColumnDef; 8] = [
    ColumnDef {
        column: Column::Avatar,
        header: "Avatar",
        width: Some(GRID_AVATAR_SIZE),
        sortable: false,
        resizable: false,
        hidden: false,
    },
    ColumnDef {
        hidden: true,
        ..data_column(Column::PatientId, "Patient ID")
    },
    data_column(Column::FirstName, "First Name"),
    ColumnDef {
        resizable: false,
        ..data_column(Column::LastName, "Last Name")
    },
    data_column(Column::Gender, "Gender"),
    data_column(Column::BirthDate, "Date of Birth"),
    data_column(Column::PhoneNumber, "Phone Number"),
    ColumnDef {
        column: Column::Actions,
        header: "Actions",
        width: None,
        sortable: false,
        resizable: false,
        hidden: false,
    },
];

impl Column {
    pub fn def(self) -> &'static ColumnDef {
        // COLUMNS lists every variant once, in declaration order.
        &COLUMNS[self as usize]
    }

    /// The row field shown in this column, for the data columns.
    pub fn value(self, row: &PatientRow) -> Option<&str> {
        match self {
            Column::PatientId => Some(row.id.as_str()),
            Column::FirstName => Some(row.first_name.as_str()),
            Column::LastName => Some(row.family_name.as_str()),
            Column::Gender => Some(row.gender.as_str()),
            Column::BirthDate => Some(row.birth_date.as_str()),
            Column::PhoneNumber => Some(row.phone_number.as_str()),
            Column::Avatar | Column::Actions => None,
        }
    }
}

impl FromStr for Column {
    type Err = FinderError;

    /// Accepts the row field name (`firstName`), the header (`First Name`) or a short alias.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
            .collect::<String>()
            .to_lowercase();
        match key.as_str() {
            "id" | "patientid" => Ok(Column::PatientId),
            "first" | "firstname" => Ok(Column::FirstName),
            "last" | "lastname" | "family" | "familyname" => Ok(Column::LastName),
            "gender" => Ok(Column::Gender),
            "dob" | "birthdate" | "dateofbirth" => Ok(Column::BirthDate),
            "phone" | "phonenumber" => Ok(Column::PhoneNumber),
            _ => Err(FinderError::InvalidInput(format!("unknown column '{s}'"))),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl FromStr for SortDirection {
    type Err = FinderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Ascending),
            "desc" | "descending" => Ok(SortDirection::Descending),
            other => Err(FinderError::InvalidInput(format!(
                "unknown sort direction '{other}'"
            ))),
        }
    }
}

/// Active column sort.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SortState {
    pub column: Column,
    pub direction: SortDirection,
}

impl SortState {
    /// Sort on a sortable column.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError::InvalidInput`] for the avatar and actions columns.
    pub fn new(column: Column, direction: SortDirection) -> FinderResult<Self> {
        if !column.def().sortable {
            return Err(FinderError::InvalidInput(format!(
                "column '{}' is not sortable",
                column.def().header
            )));
        }
        Ok(Self { column, direction })
    }
}

/// Sort rows in place by string comparison of the sorted column. The sort is stable.
pub fn sort_rows(rows: &mut [&PatientRow], sort: SortState) {
    rows.sort_by(|a, b| {
        let ordering = sort.column.value(a).cmp(&sort.column.value(b));
        match sort.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });
}

/// Render the visible rows as an aligned text table followed by the pager status line.
///
/// Hidden columns are left out. The avatar column shows the avatar's colour, the actions
/// column shows the commands that act on the row.
pub fn render_table(
    rows: &[&PatientRow],
    avatars: &dyn AvatarGenerator,
    pagination: &Pagination,
) -> String {
    let options = AvatarOptions::new(GRID_AVATAR_SIZE, GRID_AVATAR_RADIUS);
    let visible: Vec<&ColumnDef> = COLUMNS.iter().filter(|c| !c.hidden).collect();

    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            visible
                .iter()
                .map(|def| match def.column {
                    Column::Avatar => avatars.generate(&row.id, options).colour().to_string(),
                    Column::Actions => format!("edit {id} | delete {id}", id = row.id),
                    column => column.value(row).unwrap_or_default().to_string(),
                })
                .collect()
        })
        .collect();

    let widths: Vec<usize> = visible
        .iter()
        .enumerate()
        .map(|(i, def)| {
            cells
                .iter()
                .map(|r| r[i].chars().count())
                .chain(std::iter::once(def.header.chars().count()))
                .max()
                .unwrap_or_default()
        })
        .collect();

    let mut out = String::new();
    let header: Vec<&str> = visible.iter().map(|d| d.header).collect();
    push_line(&mut out, &header, &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_line(&mut out, &rule, &widths);
    for row in &cells {
        push_line(&mut out, row, &widths);
    }
    if cells.is_empty() {
        out.push_str("(no patients to show)\n");
    }

    let previous = if pagination.has_previous() { "[p] Previous" } else { "Previous" };
    let next = if pagination.has_next() { "[n] Next" } else { "Next" };
    let _ = writeln!(out, "{previous}  {}  {next}", pagination.status_text());
    out
}

fn push_line<S: AsRef<str>>(out: &mut String, cells: &[S], widths: &[usize]) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell.as_ref()))
        .collect();
    out.push_str(line.join("  ").trim_end());
    out.push('\n');
}
