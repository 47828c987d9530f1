//! Attendance queries on [`Storage`].

use rusqlite::params;
use tracing::{debug, info};

use super::{timestamp_column, Storage};
use crate::error::Result;
use crate::model::{AttendanceRecord, AttendanceStats, AttendanceStatus, NewAttendance};

const SELECT_ATTENDANCE: &str = r"
SELECT id, studentId, studentName, rollNumber, status, date, subject, class, timestamp
FROM attendance
";

impl Storage {
    /// Store one session's marks as a single unit of work.
    ///
    /// All records are written inside one transaction using one prepared
    /// statement. If any insert fails the transaction is rolled back and no
    /// record from the batch is kept. Returns the number of rows written.
    ///
    /// Nothing stops the same session from being saved twice; use
    /// [`Storage::session_exists`] to detect that before saving.
    ///
    /// # Errors
    ///
    /// Returns an error if any insert or the commit fails.
    pub fn save_attendance_batch(&mut self, records: &[NewAttendance]) -> Result<usize> {
        if records.is_empty() {
            debug!("Empty attendance batch, nothing to save");
            return Ok(0);
        }

        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                r"
                INSERT INTO attendance
                    (studentId, studentName, rollNumber, status, date, subject, class)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ",
            )?;

            for record in records {
                stmt.execute(params![
                    record.student_id,
                    record.student_name,
                    record.roll_number,
                    record.status.as_str(),
                    record.date,
                    record.subject,
                    record.class,
                ])?;
            }
        }
        tx.commit()?;

        info!("Saved {} attendance record(s)", records.len());
        Ok(records.len())
    }

    /// List the marks taken on `date`, ordered by roll number.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_attendance_by_date(&self, date: &str) -> Result<Vec<AttendanceRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SELECT_ATTENDANCE} WHERE date = ?1 ORDER BY rollNumber"))?;

        let records = stmt
            .query_map([date], Self::row_to_record)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(records)
    }

    /// List the marks taken on `date` for `subject`, ordered by roll number.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_attendance_by_date_and_subject(
        &self,
        date: &str,
        subject: &str,
    ) -> Result<Vec<AttendanceRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{SELECT_ATTENDANCE} WHERE date = ?1 AND subject = ?2 ORDER BY rollNumber"
        ))?;

        let records = stmt
            .query_map(params![date, subject], Self::row_to_record)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(records)
    }

    /// List every mark, most recent session first.
    ///
    /// Rows are ordered by session date, then insert time, both descending.
    /// Rows inserted within the same second keep insert order reversed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_all_attendance(&self) -> Result<Vec<AttendanceRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{SELECT_ATTENDANCE} ORDER BY date DESC, timestamp DESC, id DESC"
        ))?;

        let records = stmt
            .query_map([], Self::row_to_record)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(records)
    }

    /// Count present and absent marks for sessions dated `start..=end`.
    ///
    /// Dates compare as text, so both bounds should be `YYYY-MM-DD`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn attendance_stats(&self, start: &str, end: &str) -> Result<AttendanceStats> {
        let stats = self.conn.query_row(
            r"
            SELECT
                COALESCE(SUM(CASE WHEN status = 'present' THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN status = 'absent' THEN 1 ELSE 0 END), 0)
            FROM attendance
            WHERE date BETWEEN ?1 AND ?2
            ",
            params![start, end],
            |row| {
                Ok(AttendanceStats {
                    total_present: row.get(0)?,
                    total_absent: row.get(1)?,
                })
            },
        )?;
        Ok(stats)
    }

    /// Check whether any mark exists for the session `(date, subject, class)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn session_exists(&self, date: &str, subject: &str, class: &str) -> Result<bool> {
        let exists: bool = self.conn.query_row(
            r"
            SELECT EXISTS(
                SELECT 1 FROM attendance WHERE date = ?1 AND subject = ?2 AND class = ?3
            )
            ",
            params![date, subject, class],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// Count stored attendance marks.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count_attendance(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM attendance", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Convert a database row to an `AttendanceRecord` struct.
    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<AttendanceRecord> {
        let status_str: String = row.get(4)?;
        let status = status_str.parse::<AttendanceStatus>().map_err(|err| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(err))
        })?;

        Ok(AttendanceRecord {
            id: row.get(0)?,
            student_id: row.get(1)?,
            student_name: row.get(2)?,
            roll_number: row.get(3)?,
            status,
            date: row.get(5)?,
            subject: row.get(6)?,
            class: row.get(7)?,
            timestamp: timestamp_column(row, 8)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Student;

    fn create_test_storage() -> Storage {
        Storage::open_in_memory().expect("failed to create test storage")
    }

    fn add_class(storage: &Storage, class: &str, students: &[(&str, &str)]) -> Vec<Student> {
        for (name, roll) in students {
            storage.add_student(name, roll, class).unwrap();
        }
        storage.list_students_by_class(class).unwrap()
    }

    fn marks(
        students: &[Student],
        date: &str,
        subject: &str,
        absent: &[&str],
    ) -> Vec<NewAttendance> {
        students
            .iter()
            .map(|s| {
                let status = if absent.contains(&s.roll_number.as_str()) {
                    AttendanceStatus::Absent
                } else {
                    AttendanceStatus::Present
                };
                NewAttendance::for_student(s, date, subject, status)
            })
            .collect()
    }

    #[test]
    fn test_save_batch_and_query_session() {
        let mut storage = create_test_storage();
        let students = add_class(
            &storage,
            "CS-A",
            &[("A", "101"), ("B", "102"), ("C", "103")],
        );
        let batch = marks(&students, "2024-03-01", "Mathematics", &["102"]);

        assert_eq!(storage.save_attendance_batch(&batch).unwrap(), 3);

        let rows = storage
            .list_attendance_by_date_and_subject("2024-03-01", "Mathematics")
            .unwrap();
        assert_eq!(rows.len(), batch.len());
        for (row, input) in rows.iter().zip(&batch) {
            assert_eq!(row.student_id, input.student_id);
            assert_eq!(row.roll_number, input.roll_number);
            assert_eq!(row.status, input.status);
            assert_eq!(row.class, "CS-A");
        }
    }

    #[test]
    fn test_empty_batch_is_noop() {
        let mut storage = create_test_storage();
        assert_eq!(storage.save_attendance_batch(&[]).unwrap(), 0);
        assert_eq!(storage.count_attendance().unwrap(), 0);
    }

    #[test]
    fn test_failed_batch_rolls_back() {
        let mut storage = create_test_storage();
        let students = add_class(
            &storage,
            "CS-A",
            &[("A", "101"), ("boom", "102"), ("C", "103")],
        );
        storage
            .conn
            .execute_batch(
                r"
                CREATE TRIGGER reject_boom BEFORE INSERT ON attendance
                WHEN NEW.studentName = 'boom'
                BEGIN SELECT RAISE(ABORT, 'rejected'); END;
                ",
            )
            .unwrap();

        let batch = marks(&students, "2024-03-01", "Mathematics", &[]);
        assert!(storage.save_attendance_batch(&batch).is_err());
        assert_eq!(storage.count_attendance().unwrap(), 0);
    }

    #[test]
    fn test_duplicate_session_is_accepted() {
        let mut storage = create_test_storage();
        let students = add_class(&storage, "CS-A", &[("A", "101")]);
        let batch = marks(&students, "2024-03-01", "Mathematics", &[]);

        assert!(!storage
            .session_exists("2024-03-01", "Mathematics", "CS-A")
            .unwrap());
        storage.save_attendance_batch(&batch).unwrap();
        assert!(storage
            .session_exists("2024-03-01", "Mathematics", "CS-A")
            .unwrap());
        storage.save_attendance_batch(&batch).unwrap();

        assert_eq!(storage.count_attendance().unwrap(), 2);
        assert!(!storage
            .session_exists("2024-03-01", "Mathematics", "CS-B")
            .unwrap());
    }

    #[test]
    fn test_list_by_date_ordered_by_roll() {
        let mut storage = create_test_storage();
        let students = add_class(&storage, "CS-A", &[("B", "102"), ("A", "101")]);
        let mut batch = marks(&students, "2024-03-01", "Physics", &[]);
        batch.reverse();
        storage.save_attendance_batch(&batch).unwrap();
        storage
            .save_attendance_batch(&marks(&students, "2024-03-02", "Physics", &[]))
            .unwrap();

        let rows = storage.list_attendance_by_date("2024-03-01").unwrap();
        let rolls: Vec<&str> = rows.iter().map(|r| r.roll_number.as_str()).collect();
        assert_eq!(rolls, vec!["101", "102"]);
        assert!(rows.iter().all(|r| r.date == "2024-03-01"));
    }

    #[test]
    fn test_list_by_date_and_subject_filters_subject() {
        let mut storage = create_test_storage();
        let students = add_class(&storage, "CS-A", &[("A", "101")]);
        storage
            .save_attendance_batch(&marks(&students, "2024-03-01", "Physics", &[]))
            .unwrap();
        storage
            .save_attendance_batch(&marks(&students, "2024-03-01", "English", &[]))
            .unwrap();

        let rows = storage
            .list_attendance_by_date_and_subject("2024-03-01", "English")
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].subject, "English");
    }

    #[test]
    fn test_list_all_most_recent_first() {
        let mut storage = create_test_storage();
        let students = add_class(&storage, "CS-A", &[("A", "101")]);
        storage
            .save_attendance_batch(&marks(&students, "2024-03-01", "Physics", &[]))
            .unwrap();
        storage
            .save_attendance_batch(&marks(&students, "2024-03-02", "Physics", &[]))
            .unwrap();
        storage
            .save_attendance_batch(&marks(&students, "2024-03-01", "English", &[]))
            .unwrap();

        let rows = storage.list_all_attendance().unwrap();
        let order: Vec<(&str, &str)> = rows
            .iter()
            .map(|r| (r.date.as_str(), r.subject.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("2024-03-02", "Physics"),
                ("2024-03-01", "English"),
                ("2024-03-01", "Physics"),
            ]
        );
    }

    #[test]
    fn test_stats_match_per_date_counts() {
        let mut storage = create_test_storage();
        let students = add_class(
            &storage,
            "CS-A",
            &[("A", "101"), ("B", "102"), ("C", "103")],
        );
        let sessions = [
            ("2023-12-31", vec!["101"]),
            ("2024-01-01", vec!["102"]),
            ("2024-01-15", vec![]),
            ("2024-01-31", vec!["101", "103"]),
            ("2024-02-01", vec!["101"]),
        ];
        for (date, absent) in &sessions {
            storage
                .save_attendance_batch(&marks(&students, date, "Mathematics", absent))
                .unwrap();
        }

        let stats = storage
            .attendance_stats("2024-01-01", "2024-01-31")
            .unwrap();

        let mut present = 0;
        let mut absent = 0;
        for date in ["2024-01-01", "2024-01-15", "2024-01-31"] {
            for row in storage.list_attendance_by_date(date).unwrap() {
                match row.status {
                    AttendanceStatus::Present => present += 1,
                    AttendanceStatus::Absent => absent += 1,
                }
            }
        }
        assert_eq!(stats.total_present, present);
        assert_eq!(stats.total_absent, absent);
        assert_eq!(stats.total_present, 6);
        assert_eq!(stats.total_absent, 3);
    }

    #[test]
    fn test_stats_empty_range_is_zero() {
        let storage = create_test_storage();
        let stats = storage
            .attendance_stats("2024-01-01", "2024-01-31")
            .unwrap();
        assert_eq!(stats, AttendanceStats::default());
    }

    #[test]
    fn test_delete_student_keeps_attendance() {
        let mut storage = create_test_storage();
        let students = add_class(&storage, "CS-A", &[("A", "101"), ("B", "102")]);
        storage
            .save_attendance_batch(&marks(&students, "2024-03-01", "Mathematics", &[]))
            .unwrap();

        assert!(storage.delete_student(students[0].id).unwrap());
        assert!(storage
            .list_students()
            .unwrap()
            .iter()
            .all(|s| s.id != students[0].id));

        let rows = storage.list_attendance_by_date("2024-03-01").unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().any(|r| r.student_id == students[0].id));
    }

    #[test]
    fn test_end_to_end_session() {
        let mut storage = create_test_storage();
        storage.add_subject("Mathematics", "MATH101").unwrap();
        let students = add_class(&storage, "CS-A", &[("A", "101"), ("B", "102")]);
        let batch = marks(&students, "2024-03-01", "Mathematics", &["102"]);
        storage.save_attendance_batch(&batch).unwrap();

        let rows = storage.list_all_attendance().unwrap();
        assert_eq!(rows.len(), 2);
        let status_of = |name: &str| {
            rows.iter()
                .find(|r| r.student_name == name)
                .map(|r| r.status)
                .unwrap()
        };
        assert_eq!(status_of("A"), AttendanceStatus::Present);
        assert_eq!(status_of("B"), AttendanceStatus::Absent);
    }
}
