pub fn map_not_found_as_none<T>(result: Result<T, sqlx::Error>) -> Result<Option<T>, sqlx::Error> {
    match result {
        Ok(ok) => Ok(Some(ok)),
        Err(e) => {
            if matches!(e, sqlx::Error::RowNotFound) {
                Ok(None)
            } else {
                Err(e)
            }
        }
    }
}

pub fn is_unique_violation(error: &sqlx::Error) -> bool {
    error
        .as_database_error()
        .is_some_and(|e| e.is_unique_violation())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_not_found_becomes_none() {
        let result: Result<i32, _> = Err(sqlx::Error::RowNotFound);
        assert_eq!(map_not_found_as_none(result).unwrap(), None);
        assert_eq!(map_not_found_as_none(Ok(7)).unwrap(), Some(7));
        assert!(map_not_found_as_none::<i32>(Err(sqlx::Error::PoolClosed)).is_err());
    }
}
