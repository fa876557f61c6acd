mod pgsql;
